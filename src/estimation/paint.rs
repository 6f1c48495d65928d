//! Paint quantities.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::to_currency;
use crate::error::{ValidationError, require_positive};
use crate::pricing::{OpeningSize, PaintRates};

/// Parse an opening size such as `"7x3"` or `"4 X 3"`.
///
/// Each side falls back to the default independently when it is missing,
/// unparsable or not positive.
pub fn parse_opening(raw: Option<&str>, default: OpeningSize) -> OpeningSize {
    let Some(raw) = raw else {
        return default;
    };

    let mut sides = raw.split(['x', 'X', '×']).map(|side| {
        side.trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v > 0.0)
    });

    OpeningSize {
        width: sides.next().flatten().unwrap_or(default.width),
        height: sides.next().flatten().unwrap_or(default.height),
    }
}

/// A wall with doors and windows cut out of it. Dimensions in feet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WallPaintInput {
    pub wall_height: f64,
    pub wall_width: f64,
    #[serde(default)]
    pub door_count: u32,
    #[serde(default)]
    pub door_dimensions: Option<String>,
    #[serde(default)]
    pub window_count: u32,
    #[serde(default)]
    pub window_dimensions: Option<String>,
    #[serde(default)]
    pub coats: Option<u32>,
}

/// A surface whose paintable area is already known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaPaintInput {
    pub area: f64,
    #[serde(default)]
    pub coats: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaintEstimate {
    pub wall_area: f64,
    pub openings_area: f64,
    pub paintable_area: f64,
    pub coats: u32,
    pub litres: f64,
    pub price_per_litre: Decimal,
    pub paint_cost: Decimal,
    pub labor_cost: Decimal,
    pub total_cost: Decimal,
}

pub fn wall_paint(rates: &PaintRates, input: &WallPaintInput) -> Result<PaintEstimate, ValidationError> {
    let wall_area = require_positive("wall_height", input.wall_height)?
        * require_positive("wall_width", input.wall_width)?;
    let coats = coats(rates, input.coats)?;

    let door = parse_opening(input.door_dimensions.as_deref(), rates.door);
    let window = parse_opening(input.window_dimensions.as_deref(), rates.window);
    let openings_area =
        f64::from(input.door_count) * door.area() + f64::from(input.window_count) * window.area();

    let paintable_area = wall_area - openings_area;
    if paintable_area <= 0.0 {
        return Err(ValidationError::NoPaintableArea {
            wall: wall_area,
            openings: openings_area,
        });
    }

    Ok(price(rates, wall_area, openings_area, paintable_area, coats, rates.price_per_litre))
}

/// Paint for a known area, optionally at a catalog price per litre.
pub fn area_paint(
    rates: &PaintRates,
    input: &AreaPaintInput,
    price_per_litre: Option<f64>,
) -> Result<PaintEstimate, ValidationError> {
    let area = require_positive("area", input.area)?;
    let coats = coats(rates, input.coats)?;
    let price_per_litre = match price_per_litre {
        Some(price) => require_positive("price_per_litre", price)?,
        None => rates.price_per_litre,
    };
    Ok(price(rates, area, 0.0, area, coats, price_per_litre))
}

fn coats(rates: &PaintRates, requested: Option<u32>) -> Result<u32, ValidationError> {
    match requested {
        Some(0) => Err(ValidationError::NonPositive { field: "coats" }),
        Some(coats) => Ok(coats),
        None => Ok(rates.default_coats),
    }
}

fn price(
    rates: &PaintRates,
    wall_area: f64,
    openings_area: f64,
    paintable_area: f64,
    coats: u32,
    price_per_litre: f64,
) -> PaintEstimate {
    let litres = paintable_area * f64::from(coats) / rates.coverage_per_litre;
    let paint_cost = to_currency(litres * price_per_litre);
    let labor_cost = to_currency(paintable_area * rates.labor_per_sqft);

    PaintEstimate {
        wall_area,
        openings_area,
        paintable_area,
        coats,
        litres,
        price_per_litre: to_currency(price_per_litre),
        paint_cost,
        labor_cost,
        total_cost: paint_cost + labor_cost,
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::pricing::PricingTables;

    fn rates() -> PaintRates {
        PricingTables::reference().paint
    }

    #[test]
    fn test_parse_opening() {
        let default = OpeningSize {
            width: 7.0,
            height: 3.0,
        };
        assert_eq!(
            parse_opening(Some("6x4"), default),
            OpeningSize {
                width: 6.0,
                height: 4.0
            }
        );
        assert_eq!(
            parse_opening(Some(" 6 X 4 "), default),
            OpeningSize {
                width: 6.0,
                height: 4.0
            }
        );
        assert_eq!(parse_opening(None, default), default);
        assert_eq!(parse_opening(Some("door"), default), default);
        // Sides fall back independently.
        assert_eq!(
            parse_opening(Some("5xabc"), default),
            OpeningSize {
                width: 5.0,
                height: 3.0
            }
        );
        assert_eq!(
            parse_opening(Some("0x2.5"), default),
            OpeningSize {
                width: 7.0,
                height: 2.5
            }
        );
    }

    #[test]
    fn test_wall_with_openings() {
        let input = WallPaintInput {
            wall_height: 10.0,
            wall_width: 12.0,
            door_count: 1,
            window_count: 2,
            ..Default::default()
        };
        let estimate = wall_paint(&rates(), &input).unwrap();

        // 120 - 21 - 2 * 12
        assert_eq!(estimate.openings_area, 45.0);
        assert_eq!(estimate.paintable_area, 75.0);
        assert_eq!(estimate.coats, 2);
        assert_eq!(estimate.litres, 15.0);
        assert_eq!(estimate.paint_cost, dec!(5250));
        assert_eq!(estimate.labor_cost, dec!(18750));
        assert_eq!(estimate.total_cost, dec!(24000));
    }

    #[test]
    fn test_openings_larger_than_wall_rejected() {
        let input = WallPaintInput {
            wall_height: 8.0,
            wall_width: 10.0,
            door_count: 2,
            door_dimensions: Some("7x5".into()),
            window_count: 1,
            window_dimensions: Some("4x3".into()),
            coats: Some(2),
        };
        assert_eq!(
            wall_paint(&rates(), &input),
            Err(ValidationError::NoPaintableArea {
                wall: 80.0,
                openings: 82.0
            })
        );
    }

    #[test]
    fn test_zero_coats_rejected() {
        let input = WallPaintInput {
            wall_height: 8.0,
            wall_width: 10.0,
            coats: Some(0),
            ..Default::default()
        };
        assert_eq!(
            wall_paint(&rates(), &input),
            Err(ValidationError::NonPositive { field: "coats" })
        );
    }

    #[test]
    fn test_area_paint_with_catalog_price() {
        let input = AreaPaintInput {
            area: 500.0,
            coats: Some(3),
        };
        let estimate = area_paint(&rates(), &input, Some(450.0)).unwrap();
        assert_eq!(estimate.litres, 150.0);
        assert_eq!(estimate.paint_cost, dec!(67500));
        assert_eq!(estimate.openings_area, 0.0);

        let estimate = area_paint(&rates(), &input, None).unwrap();
        assert_eq!(estimate.price_per_litre, dec!(350));
    }
}
