//! KML text serialization.
//!
//! Output is deterministic: two-space indentation, shared styles before
//! folders, and child elements in KML schema order.

use kmz_kml_models::{
    Coordinate, Document, Folder, Geometry, KML_NAMESPACE, Placemark, Style, StyleMap,
    StyleSelector,
};

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Serializes a document to KML text, including the XML declaration.
#[must_use]
pub fn render_document(doc: &Document) -> String {
    let mut w = KmlWriter::default();
    w.raw_line(XML_DECLARATION);
    w.open_attr("kml", "xmlns", KML_NAMESPACE);
    w.open("Document");

    if let Some(name) = &doc.name {
        w.element("name", name);
    }
    for selector in &doc.styles {
        match selector {
            StyleSelector::Style(style) => write_style(&mut w, style),
            StyleSelector::StyleMap(map) => write_style_map(&mut w, map),
        }
    }
    for folder in &doc.folders {
        write_folder(&mut w, folder);
    }

    w.close("Document");
    w.close("kml");
    w.out
}

/// Formats a coordinate as `lon,lat,0`.
#[must_use]
pub fn format_coordinate(c: Coordinate) -> String {
    format!("{},{},0", c.lon, c.lat)
}

fn write_folder(w: &mut KmlWriter, folder: &Folder) {
    w.open("Folder");
    w.element("name", &folder.name);
    for placemark in &folder.placemarks {
        write_placemark(w, placemark);
    }
    w.close("Folder");
}

fn write_placemark(w: &mut KmlWriter, pm: &Placemark) {
    w.open("Placemark");
    if let Some(name) = &pm.name {
        w.element("name", name);
    }
    if let Some(description) = &pm.description {
        w.element("description", description);
    }
    if let Some(url) = &pm.style_url {
        w.element("styleUrl", url);
    }
    if let Some(style) = &pm.style {
        write_style(w, style);
    }
    match &pm.geometry {
        Geometry::Point(c) => {
            w.open("Point");
            w.element("coordinates", &format_coordinate(*c));
            w.close("Point");
        }
        Geometry::LineString(coords) => {
            let text = coords
                .iter()
                .map(|c| format_coordinate(*c))
                .collect::<Vec<_>>()
                .join(" ");
            w.open("LineString");
            w.element("coordinates", &text);
            w.close("LineString");
        }
    }
    w.close("Placemark");
}

fn write_style(w: &mut KmlWriter, style: &Style) {
    match &style.id {
        Some(id) => w.open_attr("Style", "id", id),
        None => w.open("Style"),
    }
    if let Some(icon) = &style.icon {
        w.open("IconStyle");
        if let Some(color) = icon.color {
            w.element("color", &color.to_string());
        }
        if let Some(href) = &icon.href {
            w.open("Icon");
            w.element("href", href);
            w.close("Icon");
        }
        w.close("IconStyle");
    }
    if let Some(label) = &style.label {
        w.open("LabelStyle");
        if let Some(color) = label.color {
            w.element("color", &color.to_string());
        }
        w.element("scale", &label.scale.to_string());
        w.close("LabelStyle");
    }
    if let Some(line) = &style.line {
        w.open("LineStyle");
        w.element("color", &line.color.to_string());
        w.element("width", &line.width.to_string());
        w.close("LineStyle");
    }
    if let Some(balloon) = &style.balloon {
        w.open("BalloonStyle");
        w.cdata_element("text", &balloon.text);
        w.close("BalloonStyle");
    }
    w.close("Style");
}

fn write_style_map(w: &mut KmlWriter, map: &StyleMap) {
    w.open_attr("StyleMap", "id", &map.id);
    for pair in &map.pairs {
        w.open("Pair");
        w.element("key", pair.key.as_ref());
        w.element("styleUrl", &pair.style_url);
        w.close("Pair");
    }
    w.close("StyleMap");
}

#[derive(Default)]
struct KmlWriter {
    out: String,
    depth: usize,
}

impl KmlWriter {
    fn indent(&mut self) {
        for _ in 0..self.depth {
            self.out.push_str("  ");
        }
    }

    fn raw_line(&mut self, line: &str) {
        self.indent();
        self.out.push_str(line);
        self.out.push('\n');
    }

    fn open(&mut self, tag: &str) {
        self.indent();
        self.out.push('<');
        self.out.push_str(tag);
        self.out.push_str(">\n");
        self.depth += 1;
    }

    fn open_attr(&mut self, tag: &str, attr: &str, value: &str) {
        self.indent();
        self.out.push('<');
        self.out.push_str(tag);
        self.out.push(' ');
        self.out.push_str(attr);
        self.out.push_str("=\"");
        escape_xml_into(&mut self.out, value);
        self.out.push_str("\">\n");
        self.depth += 1;
    }

    fn close(&mut self, tag: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.indent();
        self.out.push_str("</");
        self.out.push_str(tag);
        self.out.push_str(">\n");
    }

    fn element(&mut self, tag: &str, text: &str) {
        self.indent();
        self.out.push('<');
        self.out.push_str(tag);
        self.out.push('>');
        escape_xml_into(&mut self.out, text);
        self.out.push_str("</");
        self.out.push_str(tag);
        self.out.push_str(">\n");
    }

    fn cdata_element(&mut self, tag: &str, text: &str) {
        self.indent();
        self.out.push('<');
        self.out.push_str(tag);
        self.out.push_str("><![CDATA[");
        let text: String = text.chars().filter(|&c| is_xml_char(c)).collect();
        // A literal `]]>` would end the section early; split it across two.
        self.out.push_str(&text.replace("]]>", "]]]]><![CDATA[>"));
        self.out.push_str("]]></");
        self.out.push_str(tag);
        self.out.push_str(">\n");
    }
}

/// Whether XML 1.0 allows `c` in a document. Control characters other than
/// tab, newline and carriage return are rejected, as are `U+FFFE`/`U+FFFF`.
const fn is_xml_char(c: char) -> bool {
    !matches!(
        c,
        '\u{0}'..='\u{8}' | '\u{b}' | '\u{c}' | '\u{e}'..='\u{1f}' | '\u{fffe}' | '\u{ffff}'
    )
}

/// Appends `text` to `out` with XML special characters escaped. Characters
/// XML cannot carry at all are dropped.
pub fn escape_xml_into(out: &mut String, text: &str) {
    let mut start = 0usize;
    for (i, c) in text.char_indices() {
        let esc = match c {
            '&' => "&amp;",
            '<' => "&lt;",
            '>' => "&gt;",
            '"' => "&quot;",
            '\'' => "&apos;",
            c if !is_xml_char(c) => "",
            _ => continue,
        };
        if start < i {
            out.push_str(&text[start..i]);
        }
        out.push_str(esc);
        start = i + c.len_utf8();
    }
    if start < text.len() {
        out.push_str(&text[start..]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kmz_kml_models::{
        BalloonStyle, IconStyle, KmlColor, LINE_WIDTH, LabelStyle, LineStyle, NamedColor,
        StylePair, StyleState,
    };

    fn sample_document() -> Document {
        let mut point = Placemark::point(Coordinate::new(-95.25, 29.5));
        point.name = Some("A & B <1>".to_string());
        point.description = point.name.clone();
        point.style = Some(Style {
            icon: Some(IconStyle {
                color: Some(NamedColor::Red.kml_color()),
                href: Some("http://x/flag.png?a=1&b=2".to_string()),
            }),
            balloon: Some(BalloonStyle {
                text: "$[name]".to_string(),
            }),
            ..Style::default()
        });

        let mut line = Placemark::line_string(vec![
            Coordinate::new(20.0, 10.0),
            Coordinate::new(21.0, 11.5),
        ]);
        line.style = Some(Style {
            line: Some(LineStyle {
                color: NamedColor::Blue.kml_color(),
                width: LINE_WIDTH,
            }),
            ..Style::default()
        });

        Document {
            name: Some("Survey".to_string()),
            styles: vec![
                StyleSelector::Style(Style {
                    id: Some("s_normal".to_string()),
                    label: Some(LabelStyle {
                        color: Some(KmlColor::TRANSPARENT_WHITE),
                        scale: 0.01,
                    }),
                    ..Style::default()
                }),
                StyleSelector::StyleMap(StyleMap {
                    id: "s".to_string(),
                    pairs: vec![StylePair {
                        key: StyleState::Normal,
                        style_url: "#s_normal".to_string(),
                    }],
                }),
            ],
            folders: vec![Folder {
                name: "AGMs".to_string(),
                placemarks: vec![point, line],
            }],
        }
    }

    #[test]
    fn starts_with_declaration_and_namespace() {
        let kml = render_document(&Document::default());
        assert!(kml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n"));
        assert!(kml.contains("<kml xmlns=\"http://www.opengis.net/kml/2.2\">"));
    }

    #[test]
    fn output_parses_as_xml() {
        let kml = render_document(&sample_document());
        let parsed = roxmltree::Document::parse(&kml).unwrap();
        let root = parsed.root_element();
        assert_eq!(root.tag_name().name(), "kml");
        assert_eq!(root.tag_name().namespace(), Some(KML_NAMESPACE));

        let name = parsed
            .descendants()
            .find(|n| n.has_tag_name("Placemark"))
            .and_then(|pm| pm.children().find(|n| n.has_tag_name("name")))
            .and_then(|n| n.text());
        assert_eq!(name, Some("A & B <1>"));

        let balloon = parsed
            .descendants()
            .find(|n| n.has_tag_name("text"))
            .and_then(|n| n.text());
        assert_eq!(balloon, Some("$[name]"));
    }

    #[test]
    fn writes_lon_lat_coordinates() {
        let kml = render_document(&sample_document());
        assert!(kml.contains("<coordinates>-95.25,29.5,0</coordinates>"));
        assert!(kml.contains("<coordinates>20,10,0 21,11.5,0</coordinates>"));
    }

    #[test]
    fn styles_precede_folders() {
        let kml = render_document(&sample_document());
        let style_map = kml.find("<StyleMap id=\"s\">").unwrap();
        let folder = kml.find("<Folder>").unwrap();
        assert!(style_map < folder);
        assert!(kml.contains("<color>00ffffff</color>"));
        assert!(kml.contains("<scale>0.01</scale>"));
        assert!(kml.contains("<width>3</width>"));
    }

    #[test]
    fn splits_cdata_terminator() {
        let mut w = KmlWriter::default();
        w.cdata_element("text", "a]]>b");
        let parsed = roxmltree::Document::parse(&w.out).unwrap();
        let text: String = parsed
            .root_element()
            .children()
            .filter_map(|n| n.text())
            .collect();
        assert_eq!(text, "a]]>b");
    }

    #[test]
    fn escapes_all_special_characters() {
        let mut out = String::new();
        escape_xml_into(&mut out, r#"<a href="x">'&'</a>"#);
        assert_eq!(
            out,
            "&lt;a href=&quot;x&quot;&gt;&apos;&amp;&apos;&lt;/a&gt;"
        );
    }

    #[test]
    fn drops_characters_xml_cannot_carry() {
        let mut out = String::new();
        escape_xml_into(&mut out, "Valve\u{1}A\tB\nC\u{1f}é\u{fffe}");
        assert_eq!(out, "ValveA\tB\nCé");

        let mut w = KmlWriter::default();
        w.element("name", "Valve\u{1}A");
        w.cdata_element("text", "x\u{b}y");
        let wrapped = format!("<root>{}</root>", w.out);
        let parsed = roxmltree::Document::parse(&wrapped).unwrap();
        let texts: Vec<String> = parsed
            .root_element()
            .children()
            .filter(roxmltree::Node::is_element)
            .map(|n| n.children().filter_map(|t| t.text()).collect())
            .collect();
        assert_eq!(texts, vec!["ValveA", "xy"]);
    }
}
