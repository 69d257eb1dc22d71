//! NGT output formatters

use super::common::{print_json, print_yaml, render, yes_no, Row};
use crate::cli::OutputFormat;
use crate::prism::ngt::NgtReport;

impl Row for NgtReport {
    fn headers() -> &'static [&'static str] {
        &["VM", "STATUS", "INSTALLED", "ENABLED", "REACHABLE", "VERSION", "EXT ID"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.vm.clone(),
            self.status.as_str().to_string(),
            yes_no(self.installed),
            yes_no(self.enabled),
            yes_no(self.reachable),
            self.version.clone(),
            self.ext_id.clone(),
        ]
    }
}

/// Output the guest tools state of one VM
pub fn output_ngt_report(report: &NgtReport, format: OutputFormat, no_header: bool) {
    match format {
        OutputFormat::Json => print_json(report),
        OutputFormat::Yaml => print_yaml(report),
        _ => render(std::slice::from_ref(report), format, no_header, "VMs"),
    }
}
