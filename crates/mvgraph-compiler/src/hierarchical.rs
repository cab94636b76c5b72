//! XML pipeline documents.
//!
//! ```xml
//! <mvxpipeline playmode="1" playspeed="3">
//!   <filter name="Reader">
//!     <parameter name="Path" value="$INPUT$"/>
//!   </filter>
//!   <filter name="Viewer"/>
//! </mvxpipeline>
//! ```
//!
//! Filters get symbolic names `lowercase(type)_N`, numbered per type in
//! declaration order. A concrete play speed inserts a `#BlockFPS` rate
//! limiter right after the first (source) filter.

use crate::error::{Error, Result};
use crate::writer::{check_field, write_graph_sections, write_header, CanonicalWriter, ConvertOptions};
use roxmltree::{Document, Node};

const HEADER_TAG: &str = "mvxpipeline";
const FILTER_TAG: &str = "filter";
const PARAMETER_TAG: &str = "parameter";

/// Symbolic name of the synthetic rate limiter.
pub const LIMITER_NAME: &str = "blockfps";

/// Resolved `playspeed` header value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaySpeed {
    /// No rate limiting.
    Unbounded,
    /// Play at the source's own rate.
    Native,
    /// Limit to this many frames per second.
    Rate(u32),
}

impl PlaySpeed {
    /// Value written for the native-speed sentinel.
    pub const NATIVE_SENTINEL: &'static str = "-1";

    /// Look up a `playspeed` index.
    pub fn from_index(index: &str) -> Result<Self> {
        match index.trim() {
            "0" => Ok(Self::Unbounded),
            "1" => Ok(Self::Native),
            "2" => Ok(Self::Rate(30)),
            "3" => Ok(Self::Rate(25)),
            "4" => Ok(Self::Rate(20)),
            "5" => Ok(Self::Rate(10)),
            "6" => Ok(Self::Rate(8)),
            "7" => Ok(Self::Rate(5)),
            "8" => Ok(Self::Rate(1)),
            other => Err(Error::document(format!("unknown playspeed index '{other}'"))),
        }
    }

    /// Rate for the limiter, if one is needed.
    pub fn limiter_rate(self) -> Option<u32> {
        match self {
            Self::Rate(rate) => Some(rate),
            Self::Unbounded | Self::Native => None,
        }
    }
}

/// Convert an XML pipeline document into canonical text.
pub fn to_canonical(xml: &str, options: &ConvertOptions) -> Result<String> {
    let doc = Document::parse(xml)?;

    let header = doc
        .descendants()
        .find(|n| n.has_tag_name(HEADER_TAG))
        .ok_or_else(|| Error::document(format!("missing <{HEADER_TAG}> header")))?;
    let play_mode = required_attr(header, "playmode")?;
    let speed = PlaySpeed::from_index(required_attr(header, "playspeed")?)?;
    check_field("playmode", play_mode)?;

    let mut writer = CanonicalWriter::new();
    write_header(&mut writer, options);

    let mut names: Vec<String> = Vec::new();
    for filter in doc.descendants().filter(|n| n.has_tag_name(FILTER_TAG)) {
        let filter_type = required_attr(filter, "name")?;
        check_field("filter type", filter_type)?;

        let symbolic = unique_name(filter_type, &names);
        writer.blank();
        writer.directive(&["createfilterbyname", filter_type, &symbolic]);

        for param in filter.descendants().filter(|n| n.has_tag_name(PARAMETER_TAG)) {
            let name = required_attr(param, "name")?;
            let value = required_attr(param, "value")?;
            check_field("parameter name", name)?;
            check_field("parameter value", value)?;
            writer.directive(&["setParams", &symbolic, name, value]);
        }
        names.push(symbolic);

        if names.len() == 1 {
            if let Some(rate) = speed.limiter_rate() {
                write_limiter(&mut writer, rate);
                names.push(LIMITER_NAME.to_string());
            }
        }
    }

    if names.is_empty() {
        tracing::warn!("pipeline document declares no filters");
    }
    tracing::debug!(filters = names.len(), ?speed, "converted XML pipeline");

    write_graph_sections(&mut writer, options, &names, false, play_mode);
    Ok(writer.finish())
}

fn required_attr<'a>(node: Node<'a, '_>, name: &str) -> Result<&'a str> {
    node.attribute(name).ok_or_else(|| {
        Error::document(format!(
            "<{}> is missing the '{name}' attribute",
            node.tag_name().name()
        ))
    })
}

/// First `type_N` not already in `taken`, counting up from 1.
fn unique_name(filter_type: &str, taken: &[String]) -> String {
    let base = filter_type.to_lowercase();
    let mut suffix = 1u32;
    loop {
        let candidate = format!("{base}_{suffix}");
        if !taken.contains(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

fn write_limiter(writer: &mut CanonicalWriter, rate: u32) {
    let rate = rate.to_string();
    writer.blank();
    writer.directive(&["createfilterbyname", "#BlockFPS", LIMITER_NAME]);
    writer.directive(&["setParams", LIMITER_NAME, "Buffer size", "1"]);
    writer.directive(&["setParams", LIMITER_NAME, "Framerate", &rate]);
    writer.directive(&["setParams", LIMITER_NAME, "Drop frames when occupied", "False"]);
}
