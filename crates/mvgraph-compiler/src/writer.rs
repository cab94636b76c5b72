//! Canonical text emission shared by the front-end converters.

use crate::canonical::SEPARATOR;
use crate::error::{Error, Result};

/// Graph name and memory pool written into converted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    pub graph_name: String,
    pub memory_pool: u32,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            graph_name: "pipeline".to_string(),
            memory_pool: 1000,
        }
    }
}

const BANNER_WIDTH: usize = 75;

/// Builds canonical text line by line.
#[derive(Debug, Default)]
pub(crate) struct CanonicalWriter {
    out: String,
}

impl CanonicalWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// `FIELD~FIELD~...~b`
    pub fn directive(&mut self, fields: &[&str]) {
        for field in fields {
            self.out.push_str(field);
            self.out.push(SEPARATOR);
        }
        self.out.push_str("b\n");
    }

    /// A directive written as a comment, kept for manual editing.
    pub fn disabled(&mut self, fields: &[&str]) {
        self.out.push('#');
        self.directive(fields);
    }

    pub fn comment(&mut self, text: &str) {
        self.out.push('#');
        self.out.push_str(text);
        self.out.push('\n');
    }

    pub fn blank(&mut self) {
        self.out.push('\n');
    }

    pub fn banner(&mut self, title: &str) {
        let rule = "#".repeat(BANNER_WIDTH);
        let inner = BANNER_WIDTH - 6;
        self.out.push_str(&rule);
        self.out.push('\n');
        self.out.push_str(&format!("###{title:^inner$}###\n"));
        self.out.push_str(&rule);
        self.out.push('\n');
    }

    pub fn finish(self) -> String {
        self.out
    }
}

/// Write the memory pool directive and open the filter section.
pub(crate) fn write_header(writer: &mut CanonicalWriter, options: &ConvertOptions) {
    writer.directive(&["SetMemoryPool", &options.memory_pool.to_string()]);
    writer.blank();
    writer.banner("Create Filters");
}

/// Write everything after the filter section: graph creation, attachment,
/// parameter dumps, the run directive and commented-out cleanup.
pub(crate) fn write_graph_sections(
    writer: &mut CanonicalWriter,
    options: &ConvertOptions,
    filters: &[String],
    active_get_params: bool,
    run_mode: &str,
) {
    let graph = options.graph_name.as_str();

    writer.blank();
    writer.banner("Create Graph");
    writer.blank();
    writer.directive(&["createGraph", graph]);

    writer.blank();
    writer.banner("Attach Filters");
    writer.blank();
    for filter in filters {
        writer.directive(&["attachFilter", graph, filter]);
    }

    writer.blank();
    writer.banner("Get Filter Params");
    writer.blank();
    for filter in filters {
        if active_get_params {
            writer.directive(&["getParams", graph, filter]);
        } else {
            writer.disabled(&["getParams", graph, filter]);
        }
    }

    writer.blank();
    writer.banner("Run Graph");
    writer.blank();
    writer.directive(&["runGraph", graph, run_mode]);

    writer.blank();
    writer.banner("Stop Graph");
    writer.comment("NOTE: stopGraph may abort the graph prematurely,");
    writer.comment("      cleanup directives are commented out");
    writer.blank();
    writer.disabled(&["stopGraph", graph]);
    writer.disabled(&["deleteGraph", graph]);
    for filter in filters {
        writer.disabled(&["deleteFilter", filter]);
    }
}

/// Reject values that would break the line format.
pub(crate) fn check_field(what: &str, value: &str) -> Result<()> {
    if value.contains([SEPARATOR, '\n', '\r']) {
        return Err(Error::document(format!(
            "{what} '{}' contains a separator or line break",
            value.escape_debug()
        )));
    }
    Ok(())
}
