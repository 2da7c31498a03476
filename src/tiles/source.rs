use crate::{core::geo::TileCoord, MapError, Result};

/// Trait representing anything that can produce tile URLs for a given coordinate.
pub trait TileSource: Send + Sync {
    /// Build a URL for the requested `coord`.
    fn url(&self, coord: TileCoord) -> String;
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Subdomain,
    Zoom,
    X,
    Y,
    /// `{-y}`, the TMS row numbering
    InvertedY,
    /// `{r}`, the high-density suffix; always empty here
    Retina,
}

/// Tile URLs from a `{s}`/`{z}`/`{x}`/`{y}` template.
///
/// The template is parsed once; unknown placeholders are rejected up front
/// instead of producing broken URLs per tile.
#[derive(Debug, Clone)]
pub struct UrlTemplateSource {
    template: String,
    segments: Vec<Segment>,
    subdomains: Vec<String>,
}

impl UrlTemplateSource {
    pub fn new(template: impl Into<String>, subdomains: Vec<String>) -> Result<Self> {
        let template = template.into();
        let segments = parse_template(&template)?;

        if segments.contains(&Segment::Subdomain) && subdomains.is_empty() {
            return Err(MapError::Config(format!(
                "tile template '{template}' uses {{s}} but no subdomains are configured"
            )));
        }

        Ok(Self {
            template,
            segments,
            subdomains,
        })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn subdomains(&self) -> &[String] {
        &self.subdomains
    }

    /// Subdomain for a tile, rotating on `x + y` so neighbours spread over hosts
    fn subdomain(&self, coord: TileCoord) -> &str {
        if self.subdomains.is_empty() {
            return "";
        }
        let idx = ((coord.x as u64 + coord.y as u64) % self.subdomains.len() as u64) as usize;
        &self.subdomains[idx]
    }
}

impl TileSource for UrlTemplateSource {
    fn url(&self, coord: TileCoord) -> String {
        let mut url = String::with_capacity(self.template.len() + 16);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => url.push_str(text),
                Segment::Subdomain => url.push_str(self.subdomain(coord)),
                Segment::Zoom => url.push_str(&coord.z.to_string()),
                Segment::X => url.push_str(&coord.x.to_string()),
                Segment::Y => url.push_str(&coord.y.to_string()),
                Segment::InvertedY => {
                    let rows = 1u64.checked_shl(coord.z as u32).unwrap_or(u64::MAX);
                    let inverted = rows.saturating_sub(1).saturating_sub(coord.y as u64);
                    url.push_str(&inverted.to_string());
                }
                Segment::Retina => {}
            }
        }
        url
    }
}

fn parse_template(template: &str) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        if open > 0 {
            segments.push(Segment::Literal(rest[..open].to_string()));
        }
        let after = &rest[open + 1..];
        let close = after.find('}').ok_or_else(|| {
            MapError::Config(format!("unclosed placeholder in tile template '{template}'"))
        })?;

        let segment = match after[..close].trim() {
            "s" => Segment::Subdomain,
            "z" => Segment::Zoom,
            "x" => Segment::X,
            "y" => Segment::Y,
            "-y" => Segment::InvertedY,
            "r" => Segment::Retina,
            other => {
                return Err(MapError::Config(format!(
                    "unknown placeholder {{{other}}} in tile template '{template}'"
                )))
            }
        };
        segments.push(segment);
        rest = &after[close + 1..];
    }

    if !rest.is_empty() {
        segments.push(Segment::Literal(rest.to_string()));
    }
    Ok(segments)
}
