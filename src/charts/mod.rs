//! Charts module - Interactive and static chart rendering

mod plotter;
mod renderer;

pub use plotter::{ChartData, ChartPlotter};
pub use renderer::ChartRenderer;

pub type Rgb = (u8, u8, u8);

pub const ELECTRIC_RGB: Rgb = (44, 160, 44); // #2ca02c
pub const GASOLINE_RGB: Rgb = (255, 127, 14); // #ff7f0e
pub const DIESEL_RGB: Rgb = (31, 119, 180); // #1f77b4
pub const HYBRID_RGB: Rgb = (148, 103, 189); // #9467bd
pub const OTHER_RGB: Rgb = (127, 127, 127); // #7f7f7f
pub const PM25_RGB: Rgb = (214, 39, 40); // #d62728

/// Extra colors for trend lines whose fuel family has no fixed color.
pub const PALETTE: [Rgb; 8] = [
    (23, 190, 207),  // Cyan
    (140, 86, 75),   // Brown
    (227, 119, 194), // Pink
    (188, 189, 34),  // Olive
    (26, 188, 156),  // Teal
    (233, 30, 99),   // Rose
    (96, 125, 139),  // Blue Grey
    (255, 87, 34),   // Deep Orange
];

pub const TREND_TITLE: &str = "Vehicle Trends by Fuel Type";
pub const EV_PM25_TITLE: &str = "Electric Vehicles and PM2.5 Trends Over Time";
pub const NO_DATA: &str = "No Data Available";

/// Fixed color of a fuel label: electric labels are green, everything else
/// is keyed by its first word, unknown families are gray.
pub fn fuel_rgb(label: &str) -> Rgb {
    if label.contains("Electric") {
        return ELECTRIC_RGB;
    }
    match label.split_whitespace().next() {
        Some("Gasoline") => GASOLINE_RGB,
        Some("Diesel") => DIESEL_RGB,
        Some("Hybrid") => HYBRID_RGB,
        _ => OTHER_RGB,
    }
}

/// Like [`fuel_rgb`], but gives unknown families distinct palette colors so
/// several trend lines stay distinguishable.
pub fn series_rgb(label: &str, index: usize) -> Rgb {
    match fuel_rgb(label) {
        OTHER_RGB => PALETTE[index % PALETTE.len()],
        rgb => rgb,
    }
}

pub fn composition_title(year: i32) -> String {
    format!("Fuel Composition ({year})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fuel_colors() {
        assert_eq!(fuel_rgb("Electric"), ELECTRIC_RGB);
        assert_eq!(fuel_rgb("Fuel Cell Electric"), ELECTRIC_RGB);
        assert_eq!(fuel_rgb("Gasoline Hybrid"), GASOLINE_RGB);
        assert_eq!(fuel_rgb("Diesel Hybrid"), DIESEL_RGB);
        assert_eq!(fuel_rgb("Flex-Fuel"), OTHER_RGB);
    }

    #[test]
    fn test_series_colors_spread_unknown_fuels() {
        assert_eq!(series_rgb("Electric", 3), ELECTRIC_RGB);
        assert_eq!(series_rgb("Flex-Fuel", 0), PALETTE[0]);
        assert_eq!(series_rgb("Natural Gas", 1), PALETTE[1]);
        assert_eq!(series_rgb("Propane", PALETTE.len()), PALETTE[0]);
    }
}
