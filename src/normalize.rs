//! Text Normalizer - Restores Spanish Diacritics
//!
//! The template source is typed without accents. Replacements are literal
//! substring matches applied in table order, each on the output of the
//! previous one. Order is part of the contract: "anos" runs before "ano",
//! and "danos" is already covered by "anos" by the time its own rule runs.

/// Ordered replacement table. Do not reorder.
pub const REPLACEMENTS: &[(&str, &str)] = &[
    ("rol unico", "rol único"),
    ("segun", "según"),
    ("numero", "número"),
    ("cedula", "cédula"),
    ("anos", "años"),
    ("ano", "año"),
    ("canerias", "cañerías"),
    ("danos", "daños"),
    ("Desagues", "Desagües"),
    ("Sifon", "Sifón"),
];

/// Apply every replacement in table order.
///
/// Matching is not word-boundary aware, so "plano" becomes "plaño". The
/// template content has been checked against this behavior.
pub fn normalize_spanish_text(text: &str) -> String {
    REPLACEMENTS
        .iter()
        .fold(text.to_string(), |out, (from, to)| out.replace(from, to))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restores_accents() {
        assert_eq!(
            normalize_spanish_text("cedula de identidad segun rol unico"),
            "cédula de identidad según rol único"
        );
        assert_eq!(normalize_spanish_text("Destape Desagues y Sifon"), "Destape Desagües y Sifón");
    }

    #[test]
    fn test_plural_before_singular() {
        assert_eq!(normalize_spanish_text("dos anos"), "dos años");
        assert_eq!(normalize_spanish_text("un ano"), "un año");
        assert_eq!(normalize_spanish_text("danos en canerias"), "daños en cañerías");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "El arrendatario pagara los danos segun el numero de anos.",
            "cedula nacional de identidad y rol unico tributario",
            "Cambio de Sifon, Desagues y canerias",
            "CONTRATO DE ARRENDAMIENTO",
            "",
        ];
        for sample in samples {
            let once = normalize_spanish_text(sample);
            assert_eq!(normalize_spanish_text(&once), once);
        }
    }

    #[test]
    fn test_overmatches_inside_words() {
        assert_eq!(normalize_spanish_text("plano"), "plaño");
    }

    #[test]
    fn test_capitalized_label_untouched() {
        assert_eq!(normalize_spanish_text("Numero de cuenta: 00-123"), "Numero de cuenta: 00-123");
    }
}
