use super::{Caption, ContentRoot};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, trace};

const DC_NS: &str = "http://purl.org/dc/elements/1.1/";
const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

const XMP_START: &[u8] = b"<x:xmpmeta";
const XMP_END: &[u8] = b"</x:xmpmeta>";

/// Largest XMP document (sidecar or embedded packet) that will be parsed.
pub const MAX_XMP_BYTES: usize = 4 * 1024 * 1024;
/// Deepest element nesting accepted by the parser.
pub const MAX_XMP_DEPTH: usize = 64;

#[derive(Debug, Error)]
enum XmpError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sidecar is not valid UTF-8")]
    Utf8,

    #[error("document exceeds size limit")]
    TooLarge,

    #[error("element nesting too deep")]
    TooDeep,

    #[error("no XMP packet in image")]
    NoPacket,

    #[error("unbound namespace prefix: {0}")]
    UnboundPrefix(String),

    #[error("malformed XML: {0}")]
    Malformed(String),
}

/// Caption for one image. Sidecar XMP wins over the embedded packet; every
/// failure degrades to the next source and finally to an empty caption.
pub fn extract_caption(image: &Path) -> Caption {
    caption_from_sources(image, |_| true)
}

/// As [`extract_caption`], ignoring sidecars that resolve outside `root`.
pub(crate) fn extract_caption_in(root: &ContentRoot, image: &Path) -> Caption {
    caption_from_sources(image, |sidecar| root.admits_entry(sidecar))
}

fn caption_from_sources(image: &Path, admits: impl Fn(&Path) -> bool) -> Caption {
    for sidecar in sidecar_candidates(image) {
        if !sidecar.is_file() || !admits(&sidecar) {
            continue;
        }
        match read_sidecar(&sidecar) {
            Ok(caption) => return caption,
            Err(e) => debug!("Skipping sidecar {:?}: {}", sidecar, e),
        }
    }

    match read_embedded(image) {
        Ok(caption) => caption,
        Err(e) => {
            trace!("No embedded caption for {:?}: {}", image, e);
            Caption::empty()
        }
    }
}

fn sidecar_candidates(image: &Path) -> [PathBuf; 2] {
    [image.with_extension("xmp"), image.with_extension("XMP")]
}

fn read_sidecar(path: &Path) -> Result<Caption, XmpError> {
    let bytes = std::fs::read(path)?;
    if bytes.len() > MAX_XMP_BYTES {
        return Err(XmpError::TooLarge);
    }
    let xml = String::from_utf8(bytes).map_err(|_| XmpError::Utf8)?;
    let fields = parse_dc_fields(&xml)?;

    Ok(compose_caption(
        fields.sidecar_value(Field::Description),
        fields.sidecar_value(Field::Title),
    ))
}

fn read_embedded(image: &Path) -> Result<Caption, XmpError> {
    let data = std::fs::read(image)?;
    let packet = embedded_packet(&data).ok_or(XmpError::NoPacket)?;
    if packet.len() > MAX_XMP_BYTES {
        return Err(XmpError::TooLarge);
    }

    let xml: String = packet.utf8_chunks().map(|chunk| chunk.valid()).collect();
    let fields = parse_dc_fields(&xml)?;

    Ok(compose_caption(
        fields.alt_value(Field::Description),
        fields.alt_value(Field::Title),
    ))
}

/// Bytes from the first `<x:xmpmeta` through the first `</x:xmpmeta>`.
fn embedded_packet(data: &[u8]) -> Option<&[u8]> {
    let start = find(data, XMP_START)?;
    let end = find(data, XMP_END)? + XMP_END.len();
    (end > start).then(|| &data[start..end])
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}

/// `description` carries the human caption and `title` the date-like label.
pub(crate) fn compose_caption(description: String, title: String) -> Caption {
    if description.is_empty() && title.is_empty() {
        return Caption::empty();
    }

    let title_text = if description.is_empty() {
        title.clone()
    } else {
        description
    };

    let full_title = if title.is_empty() {
        title_text.clone()
    } else {
        format!("{}, on {}", title_text, title)
    };

    Caption {
        title: title_text,
        full_title,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title = 0,
    Description = 1,
}

#[derive(Debug, Default)]
struct DcFields {
    /// Leading text of the first `dc:<field>` element.
    direct: [Option<String>; 2],
    /// Leading text of the first `dc:<field>/rdf:Alt/rdf:li`.
    alt: [Option<String>; 2],
}

impl DcFields {
    fn sidecar_value(&self, field: Field) -> String {
        let direct = self.direct[field as usize].as_deref().unwrap_or("").trim();
        if direct.is_empty() {
            self.alt_value(field)
        } else {
            direct.to_string()
        }
    }

    fn alt_value(&self, field: Field) -> String {
        self.alt[field as usize]
            .as_deref()
            .unwrap_or("")
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Dc(Field),
    RdfAlt,
    RdfLi,
    Other,
}

#[derive(Debug, Clone, Copy)]
enum Capture {
    Direct(Field),
    Alt(Field),
}

struct Frame {
    kind: Kind,
    capture: Option<Capture>,
    text: String,
    child_seen: bool,
    bindings: usize,
}

/// Streaming scan for `dc:title` / `dc:description`.
///
/// Entities are limited to the XML predefined set and character references;
/// DTDs are skipped and never loaded.
fn parse_dc_fields(xml: &str) -> Result<DcFields, XmpError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().expand_empty_elements = true;

    let mut fields = DcFields::default();
    let mut namespaces: Vec<(String, String)> = vec![("xml".to_string(), XML_NS.to_string())];
    let mut stack: Vec<Frame> = Vec::new();
    let mut root_closed = false;
    let mut direct_seen = [false; 2];

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => {
                if root_closed {
                    return Err(XmpError::Malformed("content after document element".into()));
                }
                if stack.len() >= MAX_XMP_DEPTH {
                    return Err(XmpError::TooDeep);
                }
                if let Some(parent) = stack.last_mut() {
                    parent.child_seen = true;
                }

                let bindings = push_bindings(&element, &mut namespaces)?;
                let kind = classify(&element, &namespaces)?;

                let capture = match kind {
                    Kind::Dc(field) if !direct_seen[field as usize] => {
                        direct_seen[field as usize] = true;
                        Some(Capture::Direct(field))
                    }
                    Kind::RdfLi => alt_parent_field(&stack)
                        .filter(|field| fields.alt[*field as usize].is_none())
                        .map(Capture::Alt),
                    _ => None,
                };

                stack.push(Frame {
                    kind,
                    capture,
                    text: String::new(),
                    child_seen: false,
                    bindings,
                });
            }
            Ok(Event::End(_)) => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| XmpError::Malformed("unexpected end tag".into()))?;
                namespaces.truncate(namespaces.len() - frame.bindings);

                match frame.capture {
                    Some(Capture::Direct(field)) => {
                        fields.direct[field as usize] = Some(frame.text);
                    }
                    Some(Capture::Alt(field)) => fields.alt[field as usize] = Some(frame.text),
                    None => {}
                }

                if stack.is_empty() {
                    root_closed = true;
                }
            }
            Ok(Event::Text(text)) => push_text(&mut stack, &String::from_utf8_lossy(&text))?,
            Ok(Event::CData(data)) => push_text(&mut stack, &String::from_utf8_lossy(&data))?,
            Ok(Event::GeneralRef(reference)) => {
                let name = String::from_utf8_lossy(&reference);
                let resolved = resolve_reference(&name)
                    .ok_or_else(|| XmpError::Malformed(format!("undefined entity &{};", name)))?;
                push_text(&mut stack, &resolved)?;
            }
            Ok(Event::Eof) => {
                if !stack.is_empty() || !root_closed {
                    return Err(XmpError::Malformed("unclosed document".into()));
                }
                break;
            }
            Ok(_) => {}
            Err(e) => return Err(XmpError::Malformed(e.to_string())),
        }
    }

    Ok(fields)
}

fn push_bindings(
    element: &BytesStart<'_>,
    namespaces: &mut Vec<(String, String)>,
) -> Result<usize, XmpError> {
    let mut count = 0;
    for attribute in element.attributes() {
        let attribute = attribute.map_err(|e| XmpError::Malformed(e.to_string()))?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let prefix = if key == "xmlns" {
            String::new()
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            prefix.to_string()
        } else {
            continue;
        };

        let raw = String::from_utf8_lossy(&attribute.value).into_owned();
        let uri = quick_xml::escape::unescape(&raw)
            .map(|uri| uri.into_owned())
            .unwrap_or(raw);
        namespaces.push((prefix, uri));
        count += 1;
    }
    Ok(count)
}

fn classify(element: &BytesStart<'_>, namespaces: &[(String, String)]) -> Result<Kind, XmpError> {
    let name = String::from_utf8_lossy(element.name().as_ref()).into_owned();
    let (prefix, local) = name.split_once(':').unwrap_or(("", name.as_str()));

    let namespace = namespaces
        .iter()
        .rev()
        .find(|(p, _)| p == prefix)
        .map(|(_, uri)| uri.as_str());

    let namespace = match namespace {
        Some(uri) => uri,
        None if prefix.is_empty() => "",
        None => return Err(XmpError::UnboundPrefix(prefix.to_string())),
    };

    Ok(match (namespace, local) {
        (DC_NS, "title") => Kind::Dc(Field::Title),
        (DC_NS, "description") => Kind::Dc(Field::Description),
        (RDF_NS, "Alt") => Kind::RdfAlt,
        (RDF_NS, "li") => Kind::RdfLi,
        _ => Kind::Other,
    })
}

/// For an `rdf:li` about to open, the field of an enclosing `dc:x/rdf:Alt`.
fn alt_parent_field(stack: &[Frame]) -> Option<Field> {
    let [.., grandparent, parent] = stack else {
        return None;
    };
    match (grandparent.kind, parent.kind) {
        (Kind::Dc(field), Kind::RdfAlt) => Some(field),
        _ => None,
    }
}

fn push_text(stack: &mut [Frame], text: &str) -> Result<(), XmpError> {
    match stack.last_mut() {
        Some(frame) if !frame.child_seen => frame.text.push_str(text),
        Some(_) => {}
        None if text.trim().is_empty() => {}
        None => return Err(XmpError::Malformed("text outside document element".into())),
    }
    Ok(())
}

fn resolve_reference(name: &str) -> Option<String> {
    if let Some(number) = name.strip_prefix('#') {
        let code = match number.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse::<u32>().ok()?,
        };
        return char::from_u32(code).map(String::from);
    }
    quick_xml::escape::resolve_predefined_entity(name).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn alt_document(description: &str, title: &str) -> String {
        format!(
            r#"<x:xmpmeta xmlns:x="adobe:ns:meta/">
  <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
    <rdf:Description rdf:about="" xmlns:dc="http://purl.org/dc/elements/1.1/">
      <dc:description>
        <rdf:Alt><rdf:li xml:lang="x-default">{description}</rdf:li></rdf:Alt>
      </dc:description>
      <dc:title>
        <rdf:Alt><rdf:li xml:lang="x-default">{title}</rdf:li></rdf:Alt>
      </dc:title>
    </rdf:Description>
  </rdf:RDF>
</x:xmpmeta>"#
        )
    }

    fn direct_document(description: &str, title: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<x:xmpmeta xmlns:x="adobe:ns:meta/">
  <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
           xmlns:dc="http://purl.org/dc/elements/1.1/">
    <rdf:Description>
      <dc:description>{description}</dc:description>
      <dc:title>{title}</dc:title>
    </rdf:Description>
  </rdf:RDF>
</x:xmpmeta>"#
        )
    }

    fn image_with_packet(dir: &Path, name: &str, packet: &str) -> PathBuf {
        let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE1, 0x00, 0x10, 0x80, 0x81];
        bytes.extend_from_slice(b"http://ns.adobe.com/xap/1.0/\0<?xpacket begin=\"\"?>");
        bytes.extend_from_slice(packet.as_bytes());
        bytes.extend_from_slice(b"<?xpacket end=\"w\"?>\xFF\xD9");
        let path = dir.join(name);
        fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_compose_swaps_description_and_title() {
        let caption = compose_caption("Sunset".into(), "2019-08-14".into());
        assert_eq!(caption.title, "Sunset");
        assert_eq!(caption.full_title, "Sunset, on 2019-08-14");
    }

    #[test]
    fn test_compose_edge_cases() {
        assert_eq!(compose_caption(String::new(), String::new()), Caption::empty());

        let only_description = compose_caption("Duomo".into(), String::new());
        assert_eq!(only_description.title, "Duomo");
        assert_eq!(only_description.full_title, "Duomo");

        let only_title = compose_caption(String::new(), "2020-05-01".into());
        assert_eq!(only_title.title, "2020-05-01");
        assert_eq!(only_title.full_title, "2020-05-01, on 2020-05-01");
    }

    #[test]
    fn test_sidecar_wins_over_embedded() {
        let temp_dir = TempDir::new().unwrap();
        let image = image_with_packet(temp_dir.path(), "a.jpg", &alt_document("stale", "1999"));
        fs::write(temp_dir.path().join("a.xmp"), direct_document("fresh", "2020-01-02")).unwrap();

        let caption = extract_caption(&image);
        assert_eq!(caption.title, "fresh");
        assert_eq!(caption.full_title, "fresh, on 2020-01-02");
    }

    #[test]
    fn test_uppercase_sidecar_and_alt_fallback() {
        let temp_dir = TempDir::new().unwrap();
        let image = temp_dir.path().join("b.jpeg");
        fs::write(&image, b"no packet here").unwrap();
        fs::write(temp_dir.path().join("b.XMP"), alt_document("Lago &amp; monti", "")).unwrap();

        let caption = extract_caption(&image);
        assert_eq!(caption.title, "Lago & monti");
        assert_eq!(caption.full_title, "Lago & monti");
    }

    #[test]
    fn test_embedded_packet_only_reads_alt_form() {
        let temp_dir = TempDir::new().unwrap();
        let direct = image_with_packet(temp_dir.path(), "d.jpg", &direct_document("Ignored", "x"));
        assert_eq!(extract_caption(&direct), Caption::empty());

        let alt = image_with_packet(
            temp_dir.path(),
            "e.jpg",
            &alt_document("Vernazza", "2018-06-30"),
        );
        let caption = extract_caption(&alt);
        assert_eq!(caption.title, "Vernazza");
        assert_eq!(caption.full_title, "Vernazza, on 2018-06-30");
    }

    #[test]
    fn test_broken_sidecar_falls_back_to_embedded() {
        let temp_dir = TempDir::new().unwrap();
        let image = image_with_packet(temp_dir.path(), "c.jpg", &alt_document("Embedded", ""));
        fs::write(temp_dir.path().join("c.xmp"), "<x:xmpmeta><unclosed>").unwrap();
        fs::write(temp_dir.path().join("c.XMP"), [0xC3, 0x28, 0xFF]).unwrap();

        assert_eq!(extract_caption(&image).title, "Embedded");
    }

    #[test]
    fn test_never_fails_on_garbage() {
        let temp_dir = TempDir::new().unwrap();
        let cases: Vec<(&str, Vec<u8>)> = vec![
            ("empty.jpg", Vec::new()),
            ("binary.jpg", (0..=255u8).cycle().take(4096).collect()),
            ("half.jpg", b"<x:xmpmeta xmlns:x='adobe:ns:meta/'><rdf:RDF>".to_vec()),
            ("reversed.jpg", b"</x:xmpmeta> junk <x:xmpmeta".to_vec()),
            ("unbound.jpg", b"<x:xmpmeta><dc:title/></x:xmpmeta>".to_vec()),
        ];
        for (name, bytes) in cases {
            let path = temp_dir.path().join(name);
            fs::write(&path, bytes).unwrap();
            assert_eq!(extract_caption(&path), Caption::empty(), "{}", name);
        }
        assert_eq!(extract_caption(&temp_dir.path().join("missing.jpg")), Caption::empty());
    }

    #[test]
    fn test_depth_limit() {
        let mut doc = String::from(r#"<x:xmpmeta xmlns:x="adobe:ns:meta/">"#);
        doc.push_str(&"<a>".repeat(MAX_XMP_DEPTH + 1));
        doc.push_str(&"</a>".repeat(MAX_XMP_DEPTH + 1));
        doc.push_str("</x:xmpmeta>");
        assert!(matches!(parse_dc_fields(&doc), Err(XmpError::TooDeep)));
    }

    #[test]
    fn test_external_entities_are_not_expanded() {
        let doc = r#"<!DOCTYPE x [<!ENTITY ext SYSTEM "file:///etc/passwd">]>
<x:xmpmeta xmlns:x="adobe:ns:meta/" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <dc:description>&ext;</dc:description>
</x:xmpmeta>"#;
        assert!(parse_dc_fields(doc).is_err());
    }
}
