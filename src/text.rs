use std::collections::BTreeMap;

use crate::{
    core::Rgba8,
    error::{GnomonError, GnomonResult},
    model::{Asset, Composition, TextAsset},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AssetId(pub u32);

/// RGBA8 brush carried through Parley layout styling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextBrush {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl From<Rgba8> for TextBrush {
    fn from(c: Rgba8) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        }
    }
}

/// A laid-out text block. `width`/`height` are the layout extents used to
/// center the block on its clip origin at draw time.
pub struct PreparedText {
    pub layout: parley::Layout<TextBrush>,
    pub width: f32,
    pub height: f32,
}

/// Lays out every text asset of a composition once, up front. Shape assets
/// need no preparation; they rasterize straight from their paths.
pub struct PreparedAssetStore {
    ids: BTreeMap<String, AssetId>,
    texts: Vec<PreparedText>,
}

impl PreparedAssetStore {
    pub fn prepare(comp: &Composition) -> GnomonResult<Self> {
        let mut engine = TextLayoutEngine::new();
        let mut ids = BTreeMap::new();
        let mut texts = Vec::new();

        for (key, asset) in &comp.assets {
            let Asset::Text(text) = asset else {
                continue;
            };
            let prepared = engine.layout_text(text).map_err(|e| {
                GnomonError::render(format!("failed to lay out text asset '{key}': {e}"))
            })?;
            let id = AssetId(texts.len() as u32);
            ids.insert(key.clone(), id);
            texts.push(prepared);
        }

        Ok(Self { ids, texts })
    }

    pub fn id_for_key(&self, key: &str) -> GnomonResult<AssetId> {
        self.ids.get(key).copied().ok_or_else(|| {
            GnomonError::evaluation(format!("no prepared text asset for key '{key}'"))
        })
    }

    pub fn get(&self, id: AssetId) -> GnomonResult<&PreparedText> {
        self.texts
            .get(id.0 as usize)
            .ok_or_else(|| GnomonError::evaluation(format!("unknown text asset id {}", id.0)))
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}

/// Stateful wrapper around Parley's font and layout contexts. Families
/// resolve against the system collection; unset families fall back to the
/// generic sans-serif stack.
pub struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrush>,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayoutEngine {
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
        }
    }

    pub fn layout_text(&mut self, asset: &TextAsset) -> GnomonResult<PreparedText> {
        if !asset.size_px.is_finite() || asset.size_px <= 0.0 {
            return Err(GnomonError::validation(
                "text size_px must be finite and > 0",
            ));
        }

        let stack = match &asset.family {
            Some(family) => format!("{family}, sans-serif"),
            None => "sans-serif".to_string(),
        };

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, &asset.text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(stack)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(asset.size_px));
        builder.push_default(parley::style::StyleProperty::Brush(TextBrush::from(
            asset.color,
        )));

        let mut layout: parley::Layout<TextBrush> = builder.build(&asset.text);
        layout.break_all_lines(None);
        // Multi-line blocks center their lines, matching how captions and
        // conclusion cards are laid out.
        layout.align(
            None,
            parley::Alignment::Center,
            parley::AlignmentOptions::default(),
        );

        let width = layout.width();
        let height = layout.height();
        Ok(PreparedText {
            layout,
            width,
            height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        anim::Anim,
        core::{Canvas, Fps, FrameIndex, Point},
        model::PolygonAsset,
    };
    use std::collections::BTreeMap;

    fn shape_only_comp() -> Composition {
        let mut assets = BTreeMap::new();
        assets.insert(
            "tri".to_string(),
            Asset::Polygon(PolygonAsset {
                points: Anim::constant(vec![
                    Point::new(0.0, 0.0),
                    Point::new(4.0, 0.0),
                    Point::new(0.0, 4.0),
                ]),
                stroke: None,
            }),
        );
        Composition {
            fps: Fps::new(30, 1).unwrap(),
            canvas: Canvas {
                width: 64,
                height: 64,
            },
            duration: FrameIndex(1),
            assets,
            tracks: vec![],
        }
    }

    #[test]
    fn shape_assets_need_no_preparation() {
        let store = PreparedAssetStore::prepare(&shape_only_comp()).unwrap();
        assert!(store.is_empty());
        assert!(store.id_for_key("tri").is_err());
        assert!(store.get(AssetId(0)).is_err());
    }

    #[test]
    fn zero_size_text_is_rejected() {
        let mut engine = TextLayoutEngine::new();
        let asset = TextAsset {
            text: "x".to_string(),
            size_px: 0.0,
            color: Rgba8::opaque(255, 255, 255),
            family: None,
        };
        assert!(engine.layout_text(&asset).is_err());
    }
}
