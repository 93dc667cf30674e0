//! The fox32 jump tables
//!
//! Wrappers for the routines exported by the fox32rom and fox32os jump tables, with the
//! constants C programs use alongside them.

use crate::bindings::Type;
use crate::header::Header;
use anyhow::Result;

/// Routines reached without arguments or results.
fn define_all(h: &mut Header, table: &[(u32, &str)]) -> Result<()> {
    for &(address, name) in table {
        h.define(address, name, |_| Ok(()))?;
    }
    Ok(())
}

/// The complete fox32 binding header, including the macro header `call.h`.
pub fn bindings() -> Result<Header> {
    let mut header = Header::default();
    let h = &mut header;

    // ———————————————————————————————— fox32rom ———————————————————————————————— //

    h.comment("fox32rom definitions");
    h.comment("system jump table");
    define_all(h, &[
        (0xF0040000, "get_rom_version"),
        (0xF0040004, "system_vsync_handler"),
        (0xF0040008, "get_mouse_position"),
        (0xF004000C, "new_event"),
        (0xF0040010, "wait_for_event"),
        (0xF0040014, "get_next_event"),
        (0xF0040018, "panic"),
        (0xF004001C, "get_mouse_button"),
        (0xF0040020, "scancode_to_ascii"),
        (0xF0040024, "shift_pressed"),
        (0xF0040028, "shift_released"),
        (0xF004002C, "caps_pressed"),
        (0xF0040030, "poweroff"),
    ])?;
    h.comment("generic drawing jump table");
    define_all(h, &[
        (0xF0041000, "draw_str_generic"),
        (0xF0041004, "draw_format_str_generic"),
        (0xF0041008, "draw_decimal_generic"),
        (0xF004100C, "draw_hex_generic"),
        (0xF0041010, "draw_font_tile_generic"),
        (0xF0041014, "draw_tile_generic"),
        (0xF0041018, "set_tilemap"),
        (0xF004101C, "draw_pixel_generic"),
        (0xF0041020, "draw_filled_rectangle_generic"),
        (0xF0041024, "get_tilemap"),
    ])?;
    h.comment("background jump table");
    h.define(0xF0042000, "fill_background", |f| {
        f.parameter(Type::word(), "color")?;
        Ok(())
    })?;
    h.define(0xF0042004, "draw_str_to_background", |f| {
        f.parameter(Type::byte().pointer(), "str")?;
        f.parameter(Type::word(), "x")?;
        f.parameter(Type::word(), "y")?;
        f.parameter(Type::word(), "foreground_color")?;
        f.parameter(Type::word(), "background_color")?;
        f.returns_at(1, Type::word())?;
        Ok(())
    })?;
    h.define(0xF0042008, "draw_format_str_to_background", |f| {
        f.parameter(Type::byte().pointer(), "str")?;
        f.parameter(Type::word(), "x")?;
        f.parameter(Type::word(), "y")?;
        f.parameter(Type::word(), "foreground_color")?;
        f.parameter(Type::word(), "background_color")?;
        f.parameter_at(10, Type::word(), "format_value_0")?;
        f.parameter_at(11, Type::word(), "format_value_1")?;
        f.parameter_at(12, Type::word(), "format_value_2")?;
        f.parameter_at(13, Type::word(), "format_value_3")?;
        f.parameter_at(14, Type::word(), "format_value_4")?;
        f.parameter_at(15, Type::word(), "format_value_5")?;
        f.returns_at(1, Type::word())?;
        Ok(())
    })?;
    h.define(0xF004200C, "draw_decimal_to_background", |f| {
        f.parameter(Type::word(), "value")?;
        f.parameter(Type::word(), "x")?;
        f.parameter(Type::word(), "y")?;
        f.parameter(Type::word(), "foreground_color")?;
        f.parameter(Type::word(), "background_color")?;
        f.returns_at(1, Type::word())?;
        Ok(())
    })?;
    h.define(0xF0042010, "draw_hex_to_background", |f| {
        f.parameter(Type::word(), "value")?;
        f.parameter(Type::word(), "x")?;
        f.parameter(Type::word(), "y")?;
        f.parameter(Type::word(), "foreground_color")?;
        f.parameter(Type::word(), "background_color")?;
        f.returns_at(1, Type::word())?;
        Ok(())
    })?;
    h.define(0xF0042014, "draw_font_tile_to_background", |f| {
        f.parameter(Type::word(), "tile")?;
        f.parameter(Type::word(), "x")?;
        f.parameter(Type::word(), "y")?;
        f.parameter(Type::word(), "foreground_color")?;
        f.parameter(Type::word(), "background_color")?;
        Ok(())
    })?;
    h.define(0xF0042018, "draw_tile_to_background", |f| {
        f.parameter(Type::word(), "tile")?;
        f.parameter(Type::word(), "x")?;
        f.parameter(Type::word(), "y")?;
        Ok(())
    })?;
    h.define(0xF004201C, "draw_pixel_to_background", |f| {
        f.parameter(Type::word(), "x")?;
        f.parameter(Type::word(), "y")?;
        f.parameter(Type::word(), "color")?;
        Ok(())
    })?;
    h.define(0xF0042020, "draw_filled_rectangle_to_background", |f| {
        f.parameter(Type::word(), "x")?;
        f.parameter(Type::word(), "y")?;
        f.parameter(Type::word(), "width")?;
        f.parameter(Type::word(), "height")?;
        f.parameter(Type::word(), "color")?;
        Ok(())
    })?;
    h.comment("overlay jump table");
    define_all(h, &[
        (0xF0043000, "fill_overlay"),
        (0xF0043004, "draw_str_to_overlay"),
        (0xF0043008, "draw_format_str_to_overlay"),
        (0xF004300C, "draw_decimal_to_overlay"),
        (0xF0043010, "draw_hex_to_overlay"),
        (0xF0043014, "draw_font_tile_to_overlay"),
        (0xF0043018, "draw_tile_to_overlay"),
        (0xF004301C, "draw_pixel_to_overlay"),
        (0xF0043020, "draw_filled_rectangle_to_overlay"),
        (0xF0043024, "check_if_overlay_covers_position"),
        (0xF0043028, "check_if_enabled_overlay_covers_position"),
        (0xF004302C, "enable_overlay"),
        (0xF0043030, "disable_overlay"),
        (0xF0043034, "move_overlay"),
        (0xF0043038, "resize_overlay"),
        (0xF004303C, "set_overlay_framebuffer_pointer"),
        (0xF0043040, "get_unused_overlay"),
        (0xF0043044, "make_coordinates_relative_to_overlay"),
    ])?;
    h.comment("menu bar jump table");
    define_all(h, &[
        (0xF0044000, "enable_menu_bar"),
        (0xF0044004, "disable_menu_bar"),
        (0xF0044008, "menu_bar_click_event"),
        (0xF004400C, "clear_menu_bar"),
        (0xF0044010, "draw_menu_bar_root_items"),
        (0xF0044014, "draw_menu_items"),
        (0xF0044018, "close_menu"),
        (0xF004401C, "menu_update_event"),
    ])?;
    h.comment("disk jump table");
    define_all(h, &[
        (0xF0045000, "read_sector"),
        (0xF0045004, "write_sector"),
        (0xF0045008, "ryfs_open"),
        (0xF004500C, "ryfs_seek"),
        (0xF0045010, "ryfs_read"),
        (0xF0045014, "ryfs_read_whole_file"),
        (0xF0045018, "ryfs_get_size"),
        (0xF004501C, "ryfs_get_file_list"),
        (0xF0045020, "ryfs_tell"),
        (0xF0045024, "ryfs_write"),
    ])?;
    h.comment("memory copy/compare jump table");
    define_all(h, &[
        (0xF0046000, "copy_memory_bytes"),
        (0xF0046004, "copy_memory_words"),
        (0xF0046008, "copy_string"),
        (0xF004600C, "compare_memory_bytes"),
        (0xF0046010, "compare_memory_words"),
        (0xF0046014, "compare_string"),
        (0xF0046018, "string_length"),
    ])?;
    h.comment("integer jump table");
    define_all(h, &[(0xF0047000, "string_to_int")])?;
    h.comment("audio jump table");
    define_all(h, &[
        (0xF0048000, "play_audio"),
        (0xF0048004, "stop_audio"),
    ])?;
    h.comment("random number jump table");
    h.define(0xF0049000, "random", |f| {
        f.returns(Type::word())?;
        Ok(())
    })?;
    h.define(0xF0049004, "random_range", |f| {
        f.parameter_at(1, Type::word(), "minimum")?;
        f.parameter_at(2, Type::word(), "maximum")?;
        f.returns(Type::word())?;
        Ok(())
    })?;
    h.comment("keys");
    h.constant("KEY_CTRL", 0x1D)?;
    h.constant("KEY_LSHIFT", 0x2A)?;
    h.constant("KEY_RSHIFT", 0x36)?;
    h.constant("KEY_CAPS", 0x3A)?;

    // ———————————————————————————————— fox32os ————————————————————————————————— //

    h.comment("fox32os definitions");
    h.comment("system jump table");
    define_all(h, &[(0x00000810, "get_os_version")])?;
    h.comment("FXF jump table");
    define_all(h, &[(0x00000910, "parse_fxf_binary")])?;
    h.comment("task jump table");
    define_all(h, &[
        (0x00000A10, "new_task"),
        (0x00000A14, "yield_task"),
        (0x00000A18, "end_current_task"),
        (0x00000A1C, "get_current_task_id"),
        (0x00000A20, "get_unused_task_id"),
        (0x00000A24, "is_task_id_used"),
    ])?;
    h.comment("memory jump table");
    define_all(h, &[
        (0x00000B10, "allocate_memory"),
        (0x00000B14, "free_memory"),
    ])?;
    h.comment("window jump table");
    define_all(h, &[
        (0x00000C10, "new_window"),
        (0x00000C14, "destroy_window"),
        (0x00000C18, "new_window_event"),
        (0x00000C1C, "get_next_window_event"),
        (0x00000C20, "draw_title_bar_to_window"),
        (0x00000C24, "move_window"),
        (0x00000C28, "fill_window"),
        (0x00000C2C, "get_window_overlay_number"),
        (0x00000C30, "start_dragging_window"),
        (0x00000C34, "new_messagebox"),
        (0x00000C38, "get_active_window_struct"),
    ])?;
    h.comment("VFS jump table");
    define_all(h, &[
        (0x00000D10, "open"),
        (0x00000D14, "seek"),
        (0x00000D18, "tell"),
        (0x00000D1C, "read"),
        (0x00000D20, "write"),
    ])?;
    h.comment("widget jump table");
    define_all(h, &[
        (0x00000E10, "draw_widgets_to_window"),
        (0x00000E14, "handle_widget_click"),
    ])?;
    h.comment("event types");
    h.constant("EVENT_TYPE_MOUSE_CLICK", 0x00000000)?;
    h.constant("EVENT_TYPE_MOUSE_RELEASE", 0x00000001)?;
    h.constant("EVENT_TYPE_KEY_DOWN", 0x00000002)?;
    h.constant("EVENT_TYPE_KEY_UP", 0x00000003)?;
    h.constant("EVENT_TYPE_MENU_BAR_CLICK", 0x00000004)?;
    h.constant("EVENT_TYPE_MENU_UPDATE", 0x00000005)?;
    h.constant("EVENT_TYPE_MENU_CLICK", 0x00000006)?;
    h.constant("EVENT_TYPE_MENU_ACK", 0x00000007)?;
    h.constant("EVENT_TYPE_BUTTON_CLICK", 0x80000000)?;
    h.constant("EVENT_TYPE_EMPTY", 0xFFFFFFFF)?;
    h.comment("widget types");
    h.constant("WIDGET_TYPE_BUTTON", 0x00000000)?;

    Ok(header)
}

// ————————————————————————————————— Tests —————————————————————————————————— //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::Convention;
    use crate::header::Item;

    #[test]
    fn table_contents() {
        let header = bindings().unwrap();
        assert_eq!(header.include(), "call.h");
        assert_eq!(header.functions().count(), 108);

        let first = header.functions().next().unwrap();
        assert_eq!((first.address(), first.name()), (0xF0040000, "get_rom_version"));
        let last = header.functions().last().unwrap();
        assert_eq!((last.address(), last.name()), (0x00000E14, "handle_widget_click"));

        assert_eq!(
            header.items().last(),
            Some(&Item::Constant {
                name: "WIDGET_TYPE_BUTTON".to_string(),
                value: 0,
            })
        );
    }

    #[test]
    fn rendered_wrappers() {
        let text = bindings().unwrap().to_string();
        assert!(text.starts_with(
            "#pragma once\n\n#include \"call.h\"\n\n// fox32rom definitions\n\n// system jump table\n\n"
        ));
        assert!(text.contains(
            "static inline unsigned int random_range(
    unsigned int minimum,
    unsigned int maximum
) {
    unsigned int result_0;
    parameter(1, minimum);
    parameter(2, maximum);
    call(0xF0049004);
    ret(0, result_0);
    return result_0;
}
"
        ));
        assert!(text.contains("    parameter(15, format_value_5);\n    call(0xF0042008);\n"));
        assert!(text.contains("#define EVENT_TYPE_BUTTON_CLICK 0x80000000\n"));
        assert!(text.contains("#define KEY_CAPS 0x0000003A\n"));
        assert!(text.ends_with("#define WIDGET_TYPE_BUTTON 0x00000000\n\n\n"));
    }

    #[test]
    fn every_wrapper_expands() {
        let header = bindings().unwrap();
        for convention in Convention::ALL {
            let expanded = header.expand(convention).unwrap();
            assert_eq!(expanded.len(), header.functions().count());

            let mut labels: Vec<usize> = expanded
                .iter()
                .flat_map(|(_, blocks)| blocks.iter().flat_map(|b| b.labels()))
                .map(|label| label.id())
                .collect();
            let total = labels.len();
            labels.dedup();
            assert_eq!(labels.len(), total);
            assert_eq!(total, expanded.len());
        }
    }
}
