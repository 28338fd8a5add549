//! Architecture registry block.
//!
//! The block opens the configuration file and ends at a line starting with `-`:
//!
//! ```text
//! sun4        sun
//! rsaix
//! i386_linux  linux
//! -
//! ```
//!
//! The first token is the network name; the optional second token is the report
//! name, defaulting to the network name. Order is significant.

use std::io::BufRead;

use crate::config::collection::EntityList;
use crate::config::error::ConfigError;
use crate::config::lines::ConfigLines;
use crate::config::schema::Architecture;

/// Read architecture lines up to the terminator or end of input.
pub fn parse_arch_block<R: BufRead>(
    lines: &mut ConfigLines<R>,
) -> Result<EntityList<Architecture>, ConfigError> {
    let mut arches = EntityList::new();

    while let Some(line) = lines.next_line()? {
        if line.starts_with('-') {
            break;
        }
        let mut tokens = line.split_whitespace();
        let Some(net_name) = tokens.next() else {
            continue;
        };
        let report_name = tokens.next().unwrap_or(net_name);
        arches.push(Architecture {
            net_name: net_name.to_string(),
            report_name: report_name.to_string(),
        });
    }

    Ok(arches)
}
