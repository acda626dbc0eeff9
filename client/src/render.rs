use std::f64::consts::{FRAC_PI_2, TAU};

use web_sys::CanvasRenderingContext2d;

use prizewheel_shared::{Participant, Resolution, WheelFrame, WheelGeometry};

use crate::palette::{label_color, sector_colors};
use crate::state::State;

/// Canvas angle of wheel-frame angle zero. The pointer sits there, at the top.
const POINTER_ANGLE: f64 = -FRAC_PI_2;
const RIM_MARGIN: f64 = 28.0;
const MAX_LABEL_CHARS: usize = 18;

struct Wheel {
    cx: f64,
    cy: f64,
    radius: f64,
}

impl Wheel {
    fn fit(width: f64, height: f64) -> Option<Self> {
        let radius = width.min(height) / 2.0 - RIM_MARGIN;
        if radius <= 0.0 {
            return None;
        }
        Some(Self {
            cx: width / 2.0,
            cy: height / 2.0,
            radius,
        })
    }
}

fn truncate_label(name: &str) -> String {
    if name.chars().count() <= MAX_LABEL_CHARS {
        return name.to_string();
    }
    let mut short = name.chars().take(MAX_LABEL_CHARS - 1).collect::<String>();
    short.push('…');
    short
}

fn label_font_px(radius: f64, sector_count: usize) -> f64 {
    let by_arc = radius * TAU / sector_count as f64 * 0.45;
    by_arc.min(radius / 9.0).max(9.0)
}

fn draw_sectors(
    ctx: &CanvasRenderingContext2d,
    wheel: &Wheel,
    roster: &[Participant],
    colors: &[String],
    rotation: f64,
    highlight: Option<usize>,
) {
    // Recomputed every frame so roster changes never reuse stale angles.
    let Some(geometry) = WheelGeometry::new(roster.len()) else {
        return;
    };
    let offset = POINTER_ANGLE + rotation;
    for (index, participant) in roster.iter().enumerate() {
        let Some((start, end)) = geometry.sector_range(index) else {
            continue;
        };
        let fill = colors.get(index).map(String::as_str).unwrap_or("#cccccc");
        ctx.begin_path();
        ctx.move_to(wheel.cx, wheel.cy);
        let _ = ctx.arc(wheel.cx, wheel.cy, wheel.radius, offset + start, offset + end);
        ctx.close_path();
        ctx.set_fill_style_str(fill);
        ctx.set_global_alpha(match highlight {
            Some(winner) if winner != index => 0.35,
            _ => 1.0,
        });
        ctx.fill();
        ctx.set_global_alpha(1.0);
        ctx.set_stroke_style_str("#ffffff");
        ctx.set_line_width(if roster.len() > 40 { 0.5 } else { 1.5 });
        ctx.stroke();

        let mid = offset + (start + end) / 2.0;
        let font_px = label_font_px(wheel.radius, roster.len());
        ctx.save();
        let _ = ctx.translate(wheel.cx, wheel.cy);
        let _ = ctx.rotate(mid);
        ctx.set_font(&format!("600 {font_px:.0}px system-ui, sans-serif"));
        ctx.set_text_align("right");
        ctx.set_text_baseline("middle");
        ctx.set_fill_style_str(label_color(fill));
        let _ = ctx.fill_text(&truncate_label(&participant.name), wheel.radius - 12.0, 0.0);
        ctx.restore();
    }

    if let Some(winner) = highlight.and_then(|index| geometry.sector_range(index)) {
        ctx.begin_path();
        ctx.move_to(wheel.cx, wheel.cy);
        let _ = ctx.arc(
            wheel.cx,
            wheel.cy,
            wheel.radius + 6.0,
            offset + winner.0,
            offset + winner.1,
        );
        ctx.close_path();
        ctx.set_stroke_style_str("#ffd400");
        ctx.set_line_width(4.0);
        ctx.stroke();
    }
}

fn draw_hub(ctx: &CanvasRenderingContext2d, wheel: &Wheel) {
    ctx.set_fill_style_str("#ffffff");
    ctx.begin_path();
    let _ = ctx.arc(wheel.cx, wheel.cy, wheel.radius * 0.12, 0.0, TAU);
    ctx.fill();
    ctx.set_stroke_style_str("#1f1f1f");
    ctx.set_line_width(3.0);
    ctx.stroke();
}

fn draw_pointer(ctx: &CanvasRenderingContext2d, wheel: &Wheel) {
    let tip_x = wheel.cx + wheel.radius * POINTER_ANGLE.cos();
    let tip_y = wheel.cy + wheel.radius * POINTER_ANGLE.sin();
    ctx.set_fill_style_str("#1f1f1f");
    ctx.begin_path();
    ctx.move_to(tip_x, tip_y + 6.0);
    ctx.line_to(tip_x - 14.0, tip_y - 22.0);
    ctx.line_to(tip_x + 14.0, tip_y - 22.0);
    ctx.close_path();
    ctx.fill();
}

fn draw_overlay(ctx: &CanvasRenderingContext2d, wheel: &Wheel, headline: &str, detail: &str) {
    ctx.set_fill_style_str("rgba(255, 255, 255, 0.82)");
    ctx.begin_path();
    let _ = ctx.arc(wheel.cx, wheel.cy, wheel.radius * 0.42, 0.0, TAU);
    ctx.fill();
    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");
    ctx.set_fill_style_str("#1f1f1f");
    let headline_px = (wheel.radius * 0.22).max(18.0);
    ctx.set_font(&format!("700 {headline_px:.0}px system-ui, sans-serif"));
    let _ = ctx.fill_text(headline, wheel.cx, wheel.cy - headline_px * 0.2);
    if !detail.is_empty() {
        let detail_px = (wheel.radius * 0.07).max(12.0);
        ctx.set_font(&format!("500 {detail_px:.0}px system-ui, sans-serif"));
        let _ = ctx.fill_text(detail, wheel.cx, wheel.cy + headline_px * 0.7);
    }
}

fn draw_message(ctx: &CanvasRenderingContext2d, width: f64, height: f64, text: &str) {
    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");
    ctx.set_fill_style_str("#5b5b5b");
    ctx.set_font("500 20px system-ui, sans-serif");
    let _ = ctx.fill_text(text, width / 2.0, height / 2.0);
}

fn winner_detail(winner: &Resolution) -> &'static str {
    if winner.is_consistent() {
        "Congratulations!"
    } else {
        "Local pick, not confirmed"
    }
}

pub fn redraw(state: &mut State) {
    let ctx = &state.ctx;
    ctx.clear_rect(0.0, 0.0, state.width, state.height);
    let Some(wheel) = Wheel::fit(state.width, state.height) else {
        return;
    };

    let frame = state.viewer.frame();
    let roster_len = match frame {
        WheelFrame::Idle => state
            .viewer
            .session()
            .map_or(0, |session| session.participants.len()),
        WheelFrame::Countdown { roster, .. }
        | WheelFrame::Spinning { roster, .. }
        | WheelFrame::Reveal { roster, .. } => roster.len(),
    };
    if state.colors.len() != roster_len {
        state.colors = sector_colors(roster_len);
    }
    let colors = &state.colors;

    match frame {
        WheelFrame::Idle => match state.viewer.session() {
            None => draw_message(ctx, state.width, state.height, "Waiting for a reward draw"),
            Some(session) if session.participants.is_empty() => {
                draw_message(ctx, state.width, state.height, "No participants yet")
            }
            Some(session) => {
                let highlight = session.winner.as_ref().map(|winner| winner.index);
                let rotation = highlight
                    .and_then(|index| WheelGeometry::new(session.participants.len())?.sector_mid(index))
                    .map_or(0.0, |mid| -mid);
                draw_sectors(ctx, &wheel, &session.participants, colors, rotation, highlight);
                draw_hub(ctx, &wheel);
                draw_pointer(ctx, &wheel);
                if let Some(winner) = &session.winner {
                    draw_overlay(ctx, &wheel, &winner.name, "Winner");
                }
            }
        },
        WheelFrame::Countdown { remaining, roster } => {
            draw_sectors(ctx, &wheel, roster, colors, 0.0, None);
            draw_hub(ctx, &wheel);
            draw_pointer(ctx, &wheel);
            draw_overlay(ctx, &wheel, &remaining.to_string(), "Get ready");
        }
        WheelFrame::Spinning { rotation, roster } => {
            draw_sectors(ctx, &wheel, roster, colors, rotation, None);
            draw_hub(ctx, &wheel);
            draw_pointer(ctx, &wheel);
        }
        WheelFrame::Reveal {
            rotation,
            roster,
            winner,
        } => {
            draw_sectors(ctx, &wheel, roster, colors, rotation, Some(winner.index));
            draw_hub(ctx, &wheel);
            draw_pointer(ctx, &wheel);
            draw_overlay(ctx, &wheel, &winner.participant.name, winner_detail(winner));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_names_are_shortened() {
        assert_eq!(truncate_label("Ada"), "Ada");
        let label = truncate_label("Bartholomew Fitzgerald-Wellington");
        assert_eq!(label.chars().count(), MAX_LABEL_CHARS);
        assert!(label.ends_with('…'));
    }

    #[test]
    fn label_font_shrinks_with_crowded_wheels() {
        let few = label_font_px(300.0, 4);
        let many = label_font_px(300.0, 200);
        assert!(few > many);
        assert!(many >= 9.0);
    }
}
