//! Topology grammar.
//!
//! # Grammar
//! ```text
//! <arch-name> [<report-name>]          architecture block, see arch.rs
//! -
//! cluster <name> <phone>
//! printer <name>
//! ws <hostname-or-range>
//! cgroup <name> <x> <y> <cluster-name>...
//! option report-other <name>
//! option report-unknown <name>
//! ```
//!
//! # Design Decisions
//! - `printer` and `ws` attach to the most recent `cluster` line
//! - Any grammar error rejects the whole file; no partial configuration escapes
//! - Workstations are put in canonical order once the file is read

use std::io::BufRead;

use crate::config::arch::parse_arch_block;
use crate::config::error::{ConfigError, ParseErrorKind};
use crate::config::lines::ConfigLines;
use crate::config::range::expand_hostspec;
use crate::config::schema::{CGroup, CGroupId, Cluster, ClusterId, Configuration, Machine, Printer};

/// Parse a complete configuration.
pub fn parse_config<R: BufRead>(reader: R) -> Result<Configuration, ConfigError> {
    let mut lines = ConfigLines::new(reader);
    let mut parser = TopologyParser::default();
    parser.config.arches = parse_arch_block(&mut lines)?;

    while let Some(line) = lines.next_line()? {
        if let Err(kind) = parser.apply(&line) {
            return Err(ConfigError::Parse {
                line: lines.line_number(),
                text: line,
                kind,
            });
        }
    }

    let mut config = parser.config;
    config.canonicalize();
    Ok(config)
}

#[derive(Default)]
struct TopologyParser {
    config: Configuration,
    current_cluster: Option<ClusterId>,
}

impl TopologyParser {
    fn apply(&mut self, line: &str) -> Result<(), ParseErrorKind> {
        let (keyword, args) = split_token(line);
        if args.is_empty() {
            return Err(ParseErrorKind::UnrecognizedLine);
        }

        match keyword {
            "cluster" => self.cluster(args),
            "printer" => self.printer(args),
            "ws" => self.workstation(args),
            "cgroup" => self.cgroup(args),
            "option" => self.option(args),
            _ => Err(ParseErrorKind::UnrecognizedLine),
        }
    }

    fn cluster(&mut self, args: &str) -> Result<(), ParseErrorKind> {
        let mut tokens = args.split_whitespace();
        let name = tokens.next().ok_or(ParseErrorKind::MissingField("cluster name"))?;
        let phone = tokens.next().ok_or(ParseErrorKind::MissingField("cluster phone"))?;

        let index = self.config.clusters.push(Cluster {
            name: name.to_string(),
            phone: phone.to_string(),
            cgroup: None,
        });
        self.current_cluster = Some(ClusterId(index));
        Ok(())
    }

    fn printer(&mut self, args: &str) -> Result<(), ParseErrorKind> {
        let cluster = self.current_cluster.ok_or(ParseErrorKind::PrinterBeforeCluster)?;
        let (name, _) = split_token(args);
        self.config.printers.push(Printer::new(name, cluster));
        Ok(())
    }

    fn workstation(&mut self, args: &str) -> Result<(), ParseErrorKind> {
        let cluster = self
            .current_cluster
            .ok_or(ParseErrorKind::WorkstationBeforeCluster)?;
        let (hostspec, _) = split_token(args);
        for name in expand_hostspec(hostspec)? {
            self.config.machines.push(Machine::new(name, cluster));
        }
        Ok(())
    }

    fn cgroup(&mut self, args: &str) -> Result<(), ParseErrorKind> {
        let mut tokens = args.split_whitespace();
        let name = tokens.next().ok_or(ParseErrorKind::MissingField("cgroup name"))?;
        let x = parse_coordinate(tokens.next(), "cgroup x")?;
        let y = parse_coordinate(tokens.next(), "cgroup y")?;

        let id = CGroupId(self.config.cgroups.len());
        let mut members = Vec::new();
        for cluster_name in tokens {
            let cluster_id = self
                .config
                .find_cluster(cluster_name)
                .ok_or_else(|| ParseErrorKind::UnknownCluster(cluster_name.to_string()))?;
            let Some(cluster) = self.config.clusters.get_mut(cluster_id.0) else {
                return Err(ParseErrorKind::UnknownCluster(cluster_name.to_string()));
            };
            if cluster.cgroup.is_some() {
                return Err(ParseErrorKind::ClusterAlreadyGrouped(cluster_name.to_string()));
            }
            cluster.cgroup = Some(id);
            members.push(cluster_id);
        }

        self.config.cgroups.push(CGroup {
            name: name.to_string(),
            x,
            y,
            clusters: members,
        });
        Ok(())
    }

    fn option(&mut self, args: &str) -> Result<(), ParseErrorKind> {
        let (option, value) = split_token(args);
        let slot = match option {
            "report-other" => &mut self.config.options.report_other,
            "report-unknown" => &mut self.config.options.report_unknown,
            _ => return Err(ParseErrorKind::UnrecognizedOption(args.to_string())),
        };
        if value.is_empty() {
            return Err(ParseErrorKind::MissingField("option value"));
        }
        *slot = Some(value.to_string());
        Ok(())
    }
}

/// Split off the first whitespace-delimited token; the remainder is left-trimmed.
fn split_token(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(end) => (&s[..end], s[end..].trim_start()),
        None => (s, ""),
    }
}

fn parse_coordinate(token: Option<&str>, field: &'static str) -> Result<i32, ParseErrorKind> {
    let token = token.ok_or(ParseErrorKind::MissingField(field))?;
    token
        .parse()
        .map_err(|_| ParseErrorKind::InvalidCoordinate(token.to_string()))
}
