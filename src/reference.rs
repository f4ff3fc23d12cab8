//! Static Reference Tables - Repair and Furnishing Price Lists
//!
//! Configuration data, rendered in row order. Never derived from the input.

use serde::Serialize;

/// One row of a reference price table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceRow {
    pub category: &'static str,
    pub description: &'static str,
    pub price: &'static str,
    pub unit: &'static str,
}

impl PriceRow {
    pub const fn new(
        category: &'static str,
        description: &'static str,
        price: &'static str,
        unit: &'static str,
    ) -> Self {
        Self { category, description, price, unit }
    }

    pub fn cells(&self) -> [&'static str; 4] {
        [self.category, self.description, self.price, self.unit]
    }
}

/// Furnished-unit rows share the standard row shape.
pub type FurnishedPriceRow = PriceRow;

pub const TABLE_HEADERS: [&str; 4] = ["ITEM", "DESCRIPCIÓN", "PRECIO UNITARIO ($)", "UNIDAD"];

/// Column widths in centimeters.
pub const COLUMN_WIDTHS_CM: [f32; 4] = [2.7, 6.8, 3.7, 2.3];

pub const HEADER_SHADING: &str = "E6E6E6";

pub const PRICE_TABLE_TITLE: &str = "Tabla referencial de precios unitarios de reparaciones (UF + IVA):";
pub const FURNISHED_TABLE_TITLE: &str =
    "Los siguientes ítems aplican solo a departamentos amoblados (UF + IVA):";

pub const PRICE_ROWS: [PriceRow; 24] = [
    PriceRow::new("Aseo", "Aseo General Básico", "1,145 UF + IVA", "c/u"),
    PriceRow::new("Aseo", "Aseo General Intenso", "1,527 UF + IVA", "c/u"),
    PriceRow::new("Pintura", "Pintura Guardapolvos", "0,046 UF + IVA", "ml"),
    PriceRow::new("Pintura", "Pintura Muros", "0,573 UF + IVA", "c/u"),
    PriceRow::new("Pintura", "Pintura Interior de Closet Chico", "0,382 UF + IVA", "c/u"),
    PriceRow::new("Pintura", "Pintura Interior de Closet Grande", "0,573 UF + IVA", "c/u"),
    PriceRow::new("Pintura", "Pintura Puerta", "0,382 UF + IVA", "c/u"),
    PriceRow::new("Pintura", "Pintura Marco de Puerta", "0,305 UF + IVA", "c/u"),
    PriceRow::new("Pintura", "Pintura Cielo", "1,145 UF + IVA", "por habitación"),
    PriceRow::new("Gasfitería", "Cambio de Flexible", "0,305 UF + IVA", "c/u"),
    PriceRow::new("Gasfitería", "Cambio de Flexible Ducha", "0,229 UF + IVA", "c/u"),
    PriceRow::new("Gasfitería", "Cambio de Challa Ducha", "0,191 UF + IVA", "c/u"),
    PriceRow::new("Gasfitería", "Destape Desagües y Sifón", "0,153 UF + IVA", "c/u"),
    PriceRow::new("Gasfitería", "Cambio de Sifón", "0,573 UF + IVA", "c/u"),
    PriceRow::new("Gasfitería", "Cambio Tapa WC", "0,954 UF + IVA", "c/u"),
    PriceRow::new("Gasfitería", "Flaper WC", "0,763 UF + IVA", "c/u"),
    PriceRow::new("Gasfitería", "Monomando Cocina", "1,145 UF + IVA", "c/u"),
    PriceRow::new("Gasfitería", "Monomando Baño", "0,763 UF + IVA", "c/u"),
    PriceRow::new("Cerrajería", "Cambio de Chapa Acceso Principal", "0,763 UF + IVA", "c/u"),
    PriceRow::new("Carpintería", "Cambio de Puerta Interior", "1,718 UF + IVA", "c/u"),
    PriceRow::new("Rep. Generales", "Reparación forado en tabique (r<6cm)", "0,954 UF + IVA", "c/u"),
    PriceRow::new("Rep. Generales", "Cambio de piso", "0,704 UF + IVA", "m2"),
    PriceRow::new("Rep. Generales", "Pérdida o daño tarjeta de acceso", "2 UF + IVA", "unidad"),
    PriceRow::new("Rep. Generales", "Pérdida o daño llave acceso y/o bodega", "0,185 UF + IVA", "unidad"),
];

pub const FURNISHED_PRICE_ROWS: [FurnishedPriceRow; 14] = [
    PriceRow::new("Mobiliario", "Cama 2 Plazas", "8,25 UF + IVA", "unidad"),
    PriceRow::new("Mobiliario", "Velador pieza principal", "2 UF + IVA", "c/u"),
    PriceRow::new("Mobiliario", "Respaldo cama pieza principal", "2 UF + IVA", "unidad"),
    PriceRow::new("Mobiliario", "Cubrecolchón cama 2 plazas", "0,75 UF + IVA", "unidad"),
    PriceRow::new("Mobiliario", "Lámpara velador", "1 UF + IVA", "c/u"),
    PriceRow::new("Mobiliario", "Mueble/arrimo", "1,5 UF + IVA", "unidad"),
    PriceRow::new("Mobiliario", "Camarote pieza chica", "5 UF + IVA", "unidad"),
    PriceRow::new("Mobiliario", "Colchón 1 plaza", "3 UF + IVA", "c/u"),
    PriceRow::new("Mobiliario", "Cubrecolchón 1 Plaza", "0,5 UF + IVA", "c/u"),
    PriceRow::new("Mobiliario", "Estante", "1,5 UF + IVA", "unidad"),
    PriceRow::new("Mobiliario", "Velador pieza chica", "1 UF + IVA", "unidad"),
    PriceRow::new("Mobiliario", "Reposición Microondas", "1,6286 UF + IVA", "c/u"),
    PriceRow::new("Mobiliario", "Reposición Juego de Terraza", "1,9227 UF + IVA", "c/u"),
    PriceRow::new("Mobiliario", "Reposición Pisos de Cocina", "1,242 UF + IVA", "c/u"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_counts() {
        assert_eq!(PRICE_ROWS.len(), 24);
        assert_eq!(FURNISHED_PRICE_ROWS.len(), 14);
    }

    #[test]
    fn test_first_rows_in_order() {
        assert_eq!(PRICE_ROWS[0].description, "Aseo General Básico");
        assert_eq!(PRICE_ROWS[23].cells(), ["Rep. Generales", "Pérdida o daño llave acceso y/o bodega", "0,185 UF + IVA", "unidad"]);
        assert_eq!(FURNISHED_PRICE_ROWS[0].description, "Cama 2 Plazas");
    }
}
