///
/// @package lxpanel-rs
///
/// @file Geometry functions
/// @copyright 2025-present Christoph Kappel <christoph@unexist.dev>
/// @version $Id$
///
/// This program can be distributed under the terms of the GNU GPLv3.
/// See the file LICENSE for details.
///

use std::collections::HashMap;
use std::fmt;
use anyhow::{anyhow, Result};
use derive_builder::Builder;
use easy_min_max::{clamp, max, min};
use hex_color::HexColor;
use log::{debug, warn};
use stdext::function_name;
use crate::config::MixedConfigVal;
use crate::rect::Rect;

pub(crate) const PANEL_HEIGHT_MIN: u16 = 16;
pub(crate) const PANEL_HEIGHT_MAX: u16 = 200;
pub(crate) const PANEL_HEIGHT_DEFAULT: u16 = 26;
pub(crate) const ICON_SIZE_DEFAULT: u16 = 24;

/// Screen edge the panel is attached to
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Edge {
    Left,
    Right,
    Top,
    #[default]
    Bottom,
}

impl Edge {
    pub(crate) fn is_horizontal(self) -> bool {
        matches!(self, Edge::Top | Edge::Bottom)
    }

    /// Position of the edge in strut properties
    pub(crate) fn strut_index(self) -> usize {
        match self {
            Edge::Left => 0,
            Edge::Right => 1,
            Edge::Top => 2,
            Edge::Bottom => 3,
        }
    }
}

impl TryFrom<&str> for Edge {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "left" => Ok(Edge::Left),
            "right" => Ok(Edge::Right),
            "top" => Ok(Edge::Top),
            "bottom" => Ok(Edge::Bottom),
            _ => Err(anyhow!("Unknown edge `{}'", value)),
        }
    }
}

/// Alignment along the edge
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Align {
    Left,
    #[default]
    Center,
    Right,
}

impl TryFrom<&str> for Align {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "left" => Ok(Align::Left),
            "center" => Ok(Align::Center),
            "right" => Ok(Align::Right),
            _ => Err(anyhow!("Unknown alignment `{}'", value)),
        }
    }
}

/// How the configured width is interpreted
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum WidthType {
    #[default]
    Percent,
    Pixel,
    Request,
}

impl TryFrom<&str> for WidthType {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "percent" => Ok(WidthType::Percent),
            "pixel" => Ok(WidthType::Pixel),
            "request" => Ok(WidthType::Request),
            _ => Err(anyhow!("Unknown width type `{}'", value)),
        }
    }
}

#[derive(Builder, Debug, Copy, Clone, PartialEq, Eq)]
#[builder(default)]
pub(crate) struct PanelConfig {
    pub(crate) edge: Edge,
    pub(crate) align: Align,
    pub(crate) margin: u16,
    pub(crate) width_type: WidthType,
    /// Either percent of the edge or pixel
    pub(crate) width: u16,
    pub(crate) height: u16,
    pub(crate) icon_size: u16,
    pub(crate) strut: bool,
    pub(crate) tray: bool,
    /// Background pixel
    pub(crate) background: u32,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            edge: Edge::default(),
            align: Align::default(),
            margin: 0,
            width_type: WidthType::default(),
            width: 100,
            height: PANEL_HEIGHT_DEFAULT,
            icon_size: ICON_SIZE_DEFAULT,
            strut: true,
            tray: true,
            background: 0,
        }
    }
}

impl fmt::Display for PanelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "edge={:?}, align={:?}, margin={}, width={} ({:?}), height={}",
               self.edge, self.align, self.margin, self.width, self.width_type, self.height)
    }
}

macro_rules! read_u16 {
    ($values:expr, $builder:expr, $field:ident) => {
        if let Some(MixedConfigVal::I(value)) = $values.get(stringify!($field)) {
            $builder.$field(clamp!(*value, 0, i32::from(u16::MAX)) as u16);
        }
    };
}

macro_rules! read_bool {
    ($values:expr, $builder:expr, $field:ident) => {
        if let Some(MixedConfigVal::B(value)) = $values.get(stringify!($field)) {
            $builder.$field(*value);
        }
    };
}

impl TryFrom<&HashMap<String, MixedConfigVal>> for PanelConfig {
    type Error = anyhow::Error;

    fn try_from(values: &HashMap<String, MixedConfigVal>) -> Result<Self, Self::Error> {
        let mut builder = PanelConfigBuilder::default();

        if let Some(MixedConfigVal::S(value)) = values.get("edge") {
            builder.edge(Edge::try_from(value.as_str())?);
        }

        if let Some(MixedConfigVal::S(value)) = values.get("align") {
            builder.align(Align::try_from(value.as_str())?);
        }

        if let Some(MixedConfigVal::S(value)) = values.get("width_type") {
            builder.width_type(WidthType::try_from(value.as_str())?);
        }

        read_u16!(values, builder, margin);
        read_u16!(values, builder, width);
        read_u16!(values, builder, height);
        read_u16!(values, builder, icon_size);
        read_bool!(values, builder, strut);
        read_bool!(values, builder, tray);

        if let Some(MixedConfigVal::S(value)) = values.get("background") {
            let color = HexColor::parse(value)?;

            builder.background((u32::from(color.r) << 16) | (u32::from(color.g) << 8) | u32::from(color.b));
        }

        Ok(builder.build()?)
    }
}

/// Compute offset and length along an edge of size `extent`
fn calculate_span(config: &PanelConfig, extent: u16) -> (i16, u16) {
    let extent = i32::from(extent);
    let mut length = i32::from(config.width);
    let mut margin = i32::from(config.margin);

    if WidthType::Percent == config.width_type {
        length = extent * clamp!(length, 1, 100) / 100;
    }

    if Align::Center != config.align {
        if margin >= extent {
            warn!("Margin is bigger than edge size {} > {}, ignoring margin", margin, extent);

            margin = 0;
        }

        length = min!(extent - margin, length);
    }

    length = clamp!(length, 1, max!(1, extent));

    let offset = match config.align {
        Align::Left => margin,
        Align::Right => max!(0, extent - length - margin),
        Align::Center => (extent - length) / 2,
    };

    (offset as i16, length as u16)
}

/// Compute the panel rectangle on a screen
///
/// # Arguments
///
/// * `config` - Panel config
/// * `screen_width` - Width of the screen
/// * `screen_height` - Height of the screen
///
/// # Returns
///
/// Absolute [`Rect`] of the panel
pub(crate) fn calculate(config: &PanelConfig, screen_width: u16, screen_height: u16) -> Rect {
    let thickness = clamp!(config.height, PANEL_HEIGHT_MIN, PANEL_HEIGHT_MAX);

    let geom = if config.edge.is_horizontal() {
        let (x, width) = calculate_span(config, screen_width);
        let y = if Edge::Top == config.edge {
            0
        } else {
            i32::from(screen_height) - i32::from(thickness)
        };

        Rect::from((x, y as i16, width, thickness))
    } else {
        let (y, height) = calculate_span(config, screen_height);
        let x = if Edge::Left == config.edge {
            0
        } else {
            i32::from(screen_width) - i32::from(thickness)
        };

        Rect::from((x as i16, y, thickness, height))
    };

    debug!("{}: config={}, geom={}", function_name!(), config, geom);

    geom
}
