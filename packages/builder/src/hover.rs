//! Hover-reveal labels for the Notes folder.
//!
//! Each Notes placemark is bound to a `StyleMap` whose `normal` style hides
//! (or shows) the label and whose `highlight` style always shows it. One
//! style map is generated per distinct `(icon href, hidden)` pair, numbered
//! in first-seen order. The pass runs in two phases: every placemark's key
//! is registered first, then the styles are synthesized and placemarks
//! rewritten to point at them.

use indexmap::IndexMap;
use kmz_kml_models::{
    BALLOON_NAME_TEMPLATE, BalloonStyle, Document, IconStyle, KmlColor, LabelStyle,
    MAP_NOTE_FALLBACK_ICON, Placemark, Style, StyleMap, StylePair, StyleSelector, StyleState,
};
use kmz_sheet_models::SheetKind;

/// Id prefix of generated Notes style maps.
pub const STYLE_MAP_PREFIX: &str = "sm_notes";

const HIDDEN_LABEL_SCALE: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct HoverKey {
    href: String,
    hidden: bool,
}

/// Binds every Notes placemark to a generated style map and returns the
/// number of style maps created. Other folders are never touched. A
/// document without a Notes folder is left unchanged.
///
/// Running the pass again replaces the previously generated styles, so the
/// result is the same as running it once.
pub fn apply_hover_styles(doc: &mut Document) -> usize {
    let notes = SheetKind::Notes.folder_name();
    let Some(folder_index) = doc.folders.iter().position(|f| f.is_named(notes)) else {
        log::debug!("No {notes} folder, skipping hover styles");
        return 0;
    };

    let keys = hover_keys(doc, folder_index);

    let mut registry: IndexMap<HoverKey, String> = IndexMap::new();
    for key in &keys {
        let next = registry.len() + 1;
        registry
            .entry(key.clone())
            .or_insert_with(|| format!("{STYLE_MAP_PREFIX}_{next}"));
    }

    doc.styles.retain(|selector| !is_generated(selector));
    for (key, id) in &registry {
        doc.styles.extend(style_selectors(id, key));
    }

    for (pm, key) in doc.folders[folder_index].placemarks.iter_mut().zip(&keys) {
        pm.style = None;
        pm.style_url = registry.get(key).map(|id| format!("#{id}"));
    }

    log::info!(
        "Bound {} {notes} placemarks to {} style maps",
        keys.len(),
        registry.len()
    );
    registry.len()
}

fn hover_keys(doc: &Document, folder_index: usize) -> Vec<HoverKey> {
    doc.folders[folder_index]
        .placemarks
        .iter()
        .map(|pm| HoverKey {
            href: resolve_icon_href(doc, pm),
            hidden: pm.label_visibility.is_hidden_by_default(),
        })
        .collect()
}

/// Icon href for a placemark: the inline style's href, then the href of a
/// shared style referenced by `styleUrl`, then the fallback icon.
fn resolve_icon_href(doc: &Document, pm: &Placemark) -> String {
    if let Some(href) = pm.inline_icon_href() {
        return href.to_string();
    }
    pm.style_url
        .as_deref()
        .and_then(|url| url.trim().strip_prefix('#'))
        .and_then(|id| referenced_style(doc, id))
        .and_then(Style::icon_href)
        .unwrap_or(MAP_NOTE_FALLBACK_ICON)
        .to_string()
}

/// Shared style for an id. A style map resolves through its `normal` pair.
fn referenced_style<'a>(doc: &'a Document, id: &str) -> Option<&'a Style> {
    doc.styles.iter().find_map(|selector| match selector {
        StyleSelector::Style(style) if style.id.as_deref() == Some(id) => Some(style),
        StyleSelector::StyleMap(map) if map.id == id => map
            .pairs
            .iter()
            .find(|pair| pair.key == StyleState::Normal)
            .and_then(|pair| pair.style_url.strip_prefix('#'))
            .and_then(|normal| doc.style(normal)),
        _ => None,
    })
}

fn is_generated(selector: &StyleSelector) -> bool {
    selector
        .id()
        .and_then(|id| id.strip_prefix(STYLE_MAP_PREFIX))
        .is_some_and(|rest| rest.starts_with('_'))
}

fn style_selectors(id: &str, key: &HoverKey) -> [StyleSelector; 3] {
    let normal_id = format!("{id}_{}", StyleState::Normal);
    let highlight_id = format!("{id}_{}", StyleState::Highlight);
    let normal_label = if key.hidden {
        LabelStyle {
            color: Some(KmlColor::TRANSPARENT_WHITE),
            scale: HIDDEN_LABEL_SCALE,
        }
    } else {
        visible_label()
    };

    let map = StyleMap {
        id: id.to_string(),
        pairs: vec![
            StylePair {
                key: StyleState::Normal,
                style_url: format!("#{normal_id}"),
            },
            StylePair {
                key: StyleState::Highlight,
                style_url: format!("#{highlight_id}"),
            },
        ],
    };

    [
        StyleSelector::Style(hover_style(normal_id, &key.href, normal_label)),
        StyleSelector::Style(hover_style(highlight_id, &key.href, visible_label())),
        StyleSelector::StyleMap(map),
    ]
}

const fn visible_label() -> LabelStyle {
    LabelStyle {
        color: Some(KmlColor::OPAQUE_WHITE),
        scale: 1.0,
    }
}

fn hover_style(id: String, href: &str, label: LabelStyle) -> Style {
    Style {
        id: Some(id),
        icon: Some(IconStyle {
            color: None,
            href: Some(href.to_string()),
        }),
        label: Some(label),
        line: None,
        balloon: Some(BalloonStyle {
            text: BALLOON_NAME_TEMPLATE.to_string(),
        }),
    }
}
