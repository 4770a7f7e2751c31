use std::collections::HashMap;

use crate::{
    compile::{DrawOp, RenderPlan},
    core::Affine,
    error::{GnomonError, GnomonResult},
    render::{FrameRGBA, RenderBackend, RenderSettings},
    text::PreparedAssetStore,
};

/// CPU rasterizer on `vello_cpu`. Stateless between frames apart from a
/// font cache keyed by font blob identity.
pub struct CpuBackend {
    settings: RenderSettings,
    font_cache: HashMap<u64, vello_cpu::peniko::FontData>,
}

impl CpuBackend {
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            settings,
            font_cache: HashMap::new(),
        }
    }
}

impl RenderBackend for CpuBackend {
    fn render_plan(
        &mut self,
        plan: &RenderPlan,
        assets: &PreparedAssetStore,
    ) -> GnomonResult<FrameRGBA> {
        let width_u16: u16 = plan
            .canvas
            .width
            .try_into()
            .map_err(|_| GnomonError::render("canvas width exceeds u16"))?;
        let height_u16: u16 = plan
            .canvas
            .height
            .try_into()
            .map_err(|_| GnomonError::render("canvas height exceeds u16"))?;

        let mut ctx = vello_cpu::RenderContext::new(width_u16, height_u16);
        let mut pixmap = vello_cpu::Pixmap::new(width_u16, height_u16);

        if let Some([r, g, b, a]) = self.settings.clear_rgba {
            ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                0.0,
                0.0,
                f64::from(plan.canvas.width),
                f64::from(plan.canvas.height),
            ));
        }

        for op in &plan.ops {
            self.draw_op(&mut ctx, op, assets)?;
        }

        ctx.flush();
        ctx.render_to_pixmap(&mut pixmap);

        Ok(FrameRGBA {
            width: plan.canvas.width,
            height: plan.canvas.height,
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }
}

impl CpuBackend {
    fn draw_op(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        op: &DrawOp,
        assets: &PreparedAssetStore,
    ) -> GnomonResult<()> {
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

        match op {
            DrawOp::FillPath {
                path,
                transform,
                color,
                opacity,
            } => {
                ctx.set_transform(affine_to_cpu(*transform));
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    color.r, color.g, color.b, color.a,
                ));
                if *opacity < 1.0 {
                    ctx.push_opacity_layer(*opacity);
                }
                ctx.fill_path(&bezpath_to_cpu(path));
                if *opacity < 1.0 {
                    ctx.pop_layer();
                }
                Ok(())
            }
            DrawOp::StrokePath {
                path,
                transform,
                color,
                width,
                opacity,
            } => {
                ctx.set_transform(affine_to_cpu(*transform));
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    color.r, color.g, color.b, color.a,
                ));
                ctx.set_stroke(vello_cpu::kurbo::Stroke::new(*width));
                if *opacity < 1.0 {
                    ctx.push_opacity_layer(*opacity);
                }
                ctx.stroke_path(&bezpath_to_cpu(path));
                if *opacity < 1.0 {
                    ctx.pop_layer();
                }
                Ok(())
            }
            DrawOp::Text {
                asset,
                transform,
                opacity,
            } => {
                let prepared = assets.get(*asset)?;

                // Text is modeled as centered on its clip origin; shift the
                // layout's top-left corner accordingly.
                let centered = *transform
                    * Affine::translate((
                        -f64::from(prepared.width) / 2.0,
                        -f64::from(prepared.height) / 2.0,
                    ));
                ctx.set_transform(affine_to_cpu(centered));

                if *opacity < 1.0 {
                    ctx.push_opacity_layer(*opacity);
                }

                for line in prepared.layout.lines() {
                    for item in line.items() {
                        let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                            continue;
                        };

                        let brush = run.style().brush;
                        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                            brush.r, brush.g, brush.b, brush.a,
                        ));

                        // Parley and vello_cpu may pin different `peniko`
                        // releases, so fonts cross the boundary as raw
                        // bytes, cached by blob identity.
                        let font = run.run().font();
                        let blob_id = font.data.id();
                        let font_data = match self.font_cache.get(&blob_id) {
                            Some(cached) => cached.clone(),
                            None => {
                                let data = vello_cpu::peniko::FontData::new(
                                    vello_cpu::peniko::Blob::from(font.data.data().to_vec()),
                                    font.index,
                                );
                                self.font_cache.insert(blob_id, data.clone());
                                data
                            }
                        };

                        let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                            id: g.id,
                            x: g.x,
                            y: g.y,
                        });
                        ctx.glyph_run(&font_data)
                            .font_size(run.run().font_size())
                            .fill_glyphs(glyphs);
                    }
                }

                if *opacity < 1.0 {
                    ctx.pop_layer();
                }

                Ok(())
            }
        }
    }
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn point_to_cpu(p: kurbo::Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &kurbo::BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}
