use std::collections::HashMap;

use cursor_icon::CursorIcon;
use tracing::debug;
use x11rb::{
    connection::Connection,
    protocol::xproto::{ConnectionExt, Cursor, Font},
};

use super::X11Error;

// Glyph indices of the standard "cursor" font
const XC_X_CURSOR: u16 = 0;
const XC_ARROW: u16 = 2;
const XC_CROSSHAIR: u16 = 34;
const XC_HAND1: u16 = 58;
const XC_RIGHT_SIDE: u16 = 96;
const XC_TOP_SIDE: u16 = 138;
const XC_XTERM: u16 = 152;

/// Glyph of the cursor font closest to a cursor icon
pub(crate) fn glyph(icon: CursorIcon) -> u16 {
    match icon {
        CursorIcon::Pointer | CursorIcon::Grab | CursorIcon::Grabbing => XC_HAND1,
        CursorIcon::Crosshair | CursorIcon::Cell => XC_CROSSHAIR,
        CursorIcon::Text | CursorIcon::VerticalText => XC_XTERM,
        CursorIcon::EwResize | CursorIcon::EResize | CursorIcon::WResize | CursorIcon::ColResize => {
            XC_RIGHT_SIDE
        }
        CursorIcon::NsResize | CursorIcon::NResize | CursorIcon::SResize | CursorIcon::RowResize => {
            XC_TOP_SIDE
        }
        CursorIcon::NotAllowed | CursorIcon::NoDrop => XC_X_CURSOR,
        _ => XC_ARROW,
    }
}

/// Glyph cursors created from the "cursor" font, one per glyph
#[derive(Debug)]
pub(crate) struct CursorCache {
    font: Font,
    cursors: HashMap<u16, Cursor>,
}

impl CursorCache {
    pub fn new<C: Connection>(connection: &C) -> Result<CursorCache, X11Error> {
        let font = connection.generate_id()?;
        connection.open_font(font, b"cursor")?;
        Ok(CursorCache {
            font,
            cursors: HashMap::new(),
        })
    }

    /// Get the cursor for an icon, creating it on first use
    pub fn get<C: Connection>(&mut self, connection: &C, icon: CursorIcon) -> Result<Cursor, X11Error> {
        let glyph = glyph(icon);
        if let Some(cursor) = self.cursors.get(&glyph) {
            return Ok(*cursor);
        }

        let cursor = connection.generate_id()?;
        connection.create_glyph_cursor(
            cursor,
            self.font,
            self.font,
            glyph,
            glyph + 1,
            0,
            0,
            0,
            0xffff,
            0xffff,
            0xffff,
        )?;
        debug!(?icon, glyph, "Created glyph cursor");
        self.cursors.insert(glyph, cursor);
        Ok(cursor)
    }

    pub fn free<C: Connection>(&mut self, connection: &C) {
        for (_, cursor) in self.cursors.drain() {
            let _ = connection.free_cursor(cursor);
        }
        let _ = connection.close_font(self.font);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icons_map_to_glyphs() {
        assert_eq!(glyph(CursorIcon::Default), XC_ARROW);
        assert_eq!(glyph(CursorIcon::Pointer), XC_HAND1);
        assert_eq!(glyph(CursorIcon::Text), XC_XTERM);
        assert_eq!(glyph(CursorIcon::EwResize), XC_RIGHT_SIDE);
        assert_eq!(glyph(CursorIcon::NsResize), XC_TOP_SIDE);
        assert_eq!(glyph(CursorIcon::NotAllowed), XC_X_CURSOR);
        assert_eq!(glyph(CursorIcon::Wait), XC_ARROW);
    }
}
