use crate::{
    core::{Affine, BezPath, Canvas, Rgba8},
    error::{GnomonError, GnomonResult},
    eval::EvaluatedGraph,
    geometry::{polygon_path, trim_bezpath},
    model::{Asset, Composition, StrokeStyle},
    text::{AssetId, PreparedAssetStore},
};

/// Flat, ordered list of draw operations for one frame.
#[derive(Clone, Debug)]
pub struct RenderPlan {
    pub canvas: Canvas,
    pub ops: Vec<DrawOp>,
}

#[derive(Clone, Debug)]
pub enum DrawOp {
    FillPath {
        path: BezPath,
        transform: Affine,
        color: Rgba8,
        opacity: f32,
    },
    StrokePath {
        path: BezPath,
        transform: Affine,
        color: Rgba8,
        width: f64,
        opacity: f32,
    },
    Text {
        asset: AssetId,
        transform: Affine,
        opacity: f32,
    },
}

/// Lowers an evaluated frame into draw ops. Fills ramp in with the stroke
/// reveal: a half-drawn shape shows a half-opaque fill, matching the way
/// progressive shape creation reads on screen.
pub fn compile_frame(
    comp: &Composition,
    eval: &EvaluatedGraph,
    assets: &PreparedAssetStore,
) -> GnomonResult<RenderPlan> {
    let mut ops = Vec::<DrawOp>::with_capacity(eval.nodes.len() * 2);

    for node in &eval.nodes {
        let Some(asset) = comp.assets.get(&node.asset) else {
            return Err(GnomonError::evaluation(format!(
                "evaluated node '{}' references missing asset key '{}'",
                node.clip_id, node.asset
            )));
        };

        let opacity = node.opacity as f32;
        if opacity <= 0.0 {
            continue;
        }

        match asset {
            Asset::Polygon(poly) => {
                let points = node.points.as_ref().ok_or_else(|| {
                    GnomonError::evaluation(format!(
                        "polygon node '{}' was evaluated without vertices",
                        node.clip_id
                    ))
                })?;
                let outline = polygon_path(points);
                push_shape_ops(
                    &mut ops,
                    outline,
                    node.transform,
                    node.fill,
                    poly.stroke,
                    node.draw,
                    opacity,
                );
            }
            Asset::Path(path_asset) => {
                let outline = parse_svg_path(&path_asset.svg_path_d)?;
                push_shape_ops(
                    &mut ops,
                    outline,
                    node.transform,
                    node.fill,
                    path_asset.stroke,
                    node.draw,
                    opacity,
                );
            }
            Asset::Text(_) => {
                let id = assets.id_for_key(&node.asset)?;
                ops.push(DrawOp::Text {
                    asset: id,
                    transform: node.transform,
                    opacity,
                });
            }
        }
    }

    Ok(RenderPlan {
        canvas: comp.canvas,
        ops,
    })
}

fn push_shape_ops(
    ops: &mut Vec<DrawOp>,
    outline: BezPath,
    transform: Affine,
    fill: Option<Rgba8>,
    stroke: Option<StrokeStyle>,
    draw: f64,
    opacity: f32,
) {
    if let Some(color) = fill {
        let color = color.scale_alpha(draw);
        if color.a > 0 {
            ops.push(DrawOp::FillPath {
                path: outline.clone(),
                transform,
                color,
                opacity,
            });
        }
    }

    if let Some(style) = stroke {
        if style.color.a > 0 && draw > 0.0 {
            let path = if draw < 1.0 {
                trim_bezpath(&outline, draw)
            } else {
                outline
            };
            ops.push(DrawOp::StrokePath {
                path,
                transform,
                color: style.color,
                width: style.width,
                opacity,
            });
        }
    }
}

fn parse_svg_path(d: &str) -> GnomonResult<BezPath> {
    let d = d.trim();
    if d.is_empty() {
        return Err(GnomonError::validation("path svg_path_d must be non-empty"));
    }

    BezPath::from_svg(d).map_err(|e| GnomonError::validation(format!("invalid svg_path_d: {e}")))
}
