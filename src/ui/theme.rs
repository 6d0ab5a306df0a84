use egui::Color32;

fn scale(color: Color32, factor: f32) -> Color32 {
    let c = |v: u8| ((f32::from(v) * factor).clamp(0.0, 255.0)) as u8;
    Color32::from_rgb(c(color.r()), c(color.g()), c(color.b()))
}

/// Colour palette and stroke geometry for the renderer. The default is a
/// dark Bitwig-style theme; `apply_clip_color` derives note and marker
/// colours from a host clip colour.
#[derive(Debug, Clone)]
pub struct Theme {
    pub background_color: Color32,
    pub white_key_color: Color32,
    pub black_key_color: Color32,

    pub grid_line_color: Color32,
    pub beat_line_color: Color32,
    pub bar_line_color: Color32,
    pub subdivision_line_color: Color32,

    pub note_fill_color: Color32,
    pub note_border_color: Color32,
    pub selected_note_fill_color: Color32,
    pub selected_note_border_color: Color32,
    pub selected_note_inner_border_color: Color32,
    pub note_label_text_color: Color32,
    pub note_shadow_color: Color32,

    pub ruler_background_color: Color32,
    pub ruler_text_color: Color32,
    pub ruler_clip_boundary_color: Color32,

    pub playback_start_marker_color: Color32,
    pub cue_marker_color: Color32,

    pub loop_region_fill_color: Color32,
    pub loop_region_hover_fill_color: Color32,
    pub loop_region_handle_hover_color: Color32,
    pub loop_ghost_color: Color32,
    pub loop_preview_fill_color: Color32,
    pub loop_preview_border_color: Color32,
    pub loop_hover_border_color: Color32,

    pub selection_rect_fill_color: Color32,
    pub selection_rect_border_color: Color32,

    pub playhead_color: Color32,

    pub spotlight_fill_color: Color32,
    pub spotlight_edge_color: Color32,

    pub drag_preview_move_color: Color32,
    pub drag_preview_duplicate_color: Color32,

    pub cc_lane_background_color: Color32,
    pub cc_lane_border_color: Color32,
    pub cc_curve_color: Color32,
    pub cc_point_color: Color32,

    pub scrollbar_track_color: Color32,
    pub scrollbar_thumb_color: Color32,

    pub piano_key_hover_color: Color32,
    pub piano_key_pressed_color: Color32,

    // Geometry
    pub note_corner_radius: f32,
    pub grid_line_thickness: f32,
    pub beat_line_thickness: f32,
    pub bar_line_thickness: f32,
    pub note_border_thickness: f32,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background_color: Color32::from_gray(26),
            white_key_color: Color32::from_gray(46),
            black_key_color: Color32::from_gray(31),

            grid_line_color: Color32::from_gray(46),
            beat_line_color: Color32::from_gray(66),
            bar_line_color: Color32::from_gray(82),
            subdivision_line_color: Color32::from_gray(51),

            note_fill_color: Color32::from_rgb(61, 148, 245),
            note_border_color: Color32::from_rgb(61, 148, 245),
            selected_note_fill_color: Color32::from_rgb(250, 209, 64),
            selected_note_border_color: Color32::from_rgb(250, 209, 64),
            selected_note_inner_border_color: Color32::WHITE,
            note_label_text_color: Color32::from_gray(230),
            note_shadow_color: Color32::from_rgba_unmultiplied(0, 0, 0, 31),

            ruler_background_color: Color32::from_gray(38),
            ruler_text_color: Color32::from_gray(230),
            ruler_clip_boundary_color: Color32::from_gray(199),

            playback_start_marker_color: Color32::from_rgb(0, 150, 255),
            cue_marker_color: Color32::from_rgb(0, 150, 255),

            loop_region_fill_color: Color32::from_gray(160),
            loop_region_hover_fill_color: Color32::from_gray(200),
            loop_region_handle_hover_color: Color32::from_rgb(255, 200, 0),
            loop_ghost_color: Color32::from_rgba_unmultiplied(160, 160, 160, 80),
            loop_preview_fill_color: Color32::from_rgba_unmultiplied(255, 255, 255, 50),
            loop_preview_border_color: Color32::from_rgba_unmultiplied(255, 255, 255, 100),
            loop_hover_border_color: Color32::from_rgba_unmultiplied(255, 255, 255, 150),

            selection_rect_fill_color: Color32::from_rgba_unmultiplied(255, 255, 255, 26),
            selection_rect_border_color: Color32::from_rgba_unmultiplied(255, 255, 255, 77),

            playhead_color: Color32::from_rgb(255, 255, 0),

            spotlight_fill_color: Color32::from_rgba_unmultiplied(255, 255, 255, 13),
            spotlight_edge_color: Color32::from_rgba_unmultiplied(255, 255, 255, 230),

            drag_preview_move_color: Color32::from_rgba_unmultiplied(79, 120, 199, 178),
            drag_preview_duplicate_color: Color32::from_rgba_unmultiplied(79, 199, 120, 178),

            cc_lane_background_color: Color32::from_gray(20),
            cc_lane_border_color: Color32::from_gray(64),
            cc_curve_color: Color32::from_rgb(89, 191, 242),
            cc_point_color: Color32::WHITE,

            scrollbar_track_color: Color32::from_gray(36),
            scrollbar_thumb_color: Color32::from_gray(102),

            piano_key_hover_color: Color32::from_rgb(199, 219, 255),
            piano_key_pressed_color: Color32::from_rgb(99, 150, 255),

            note_corner_radius: 3.0,
            grid_line_thickness: 1.0,
            beat_line_thickness: 1.0,
            bar_line_thickness: 1.5,
            note_border_thickness: 1.0,
        }
    }
}

impl Theme {
    /// Derive note and marker colours from a clip colour: selected notes
    /// darken to half, borders to a third, and the selected inner border
    /// brightens past the clip colour.
    pub fn apply_clip_color(&mut self, clip: Color32) {
        self.note_fill_color = clip;
        self.selected_note_fill_color = scale(clip, 0.5);
        self.note_border_color = scale(clip, 1.0 / 3.0);
        self.selected_note_border_color = self.note_border_color;
        self.selected_note_inner_border_color = scale(clip, 1.7);
        self.cue_marker_color = clip;
        self.playback_start_marker_color = clip;
    }

    /// Light base palette; note and marker colours are left for
    /// `apply_clip_color`.
    pub fn light() -> Self {
        Self {
            background_color: Color32::from_gray(170),
            white_key_color: Color32::from_gray(240),
            black_key_color: Color32::from_gray(40),
            grid_line_color: Color32::from_gray(120),
            beat_line_color: Color32::from_gray(100),
            bar_line_color: Color32::from_gray(80),
            subdivision_line_color: Color32::from_gray(120),
            ruler_background_color: Color32::from_gray(50),
            ruler_text_color: Color32::BLACK,
            cc_lane_background_color: Color32::from_gray(150),
            cc_lane_border_color: Color32::from_gray(110),
            ..Self::default()
        }
    }

    pub fn light_from_clip_color(clip: Color32) -> Self {
        let mut theme = Self::light();
        theme.apply_clip_color(clip);
        theme
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_color_derivations() {
        let mut theme = Theme::default();
        let clip = Color32::from_rgb(100, 200, 60);
        theme.apply_clip_color(clip);

        assert_eq!(theme.note_fill_color, clip);
        assert_eq!(theme.selected_note_fill_color, Color32::from_rgb(50, 100, 30));
        assert_eq!(theme.note_border_color, Color32::from_rgb(33, 66, 20));
        // Brightened inner border saturates at 255.
        assert_eq!(
            theme.selected_note_inner_border_color,
            Color32::from_rgb(170, 255, 102)
        );
        assert_eq!(theme.cue_marker_color, clip);
    }

    #[test]
    fn light_theme_keeps_note_colors_for_clip_pass() {
        let dark = Theme::default();
        let light = Theme::light();
        assert_eq!(light.note_fill_color, dark.note_fill_color);
        assert_ne!(light.background_color, dark.background_color);
    }
}
