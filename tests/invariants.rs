//! Contract Invariant Tests
//!
//! These tests verify the non-negotiable guarantees end to end.

use std::fs;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use leasedoc_core::{
    builder::{Block, Run, RunStyle},
    classify::{LineKind, PRICE_TABLE_MARKER},
    hashing::canonical_json,
    normalize_spanish_text,
    profile::FailureMode,
    Assembler, BuildError, BuildProfile, CompilationPipeline, PageLayout,
};

const CONTRACT: &str = "\
CONTRATO DE ARRENDAMIENTO

[[ARRENDADORA.RAZON_SOCIAL]]
CON
[[ARRENDATARIO.NOMBRE]]

PRIMERO: Partes
El arrendatario, cedula nacional de identidad [[ARRENDATARIO.RUT]], segun consta.
a) Pagar la renta
b) Reparar los danos
- Mantener el inmueble
Titular: [[ARRENDADORA.RAZON_SOCIAL]]
Numero de cuenta: [[ARRENDADORA.CUENTA.NUMERO]]
Tabla referencial de precios unitarios de reparaciones (UF + IVA):
- Aseo General Basico: 1,145 UF + IVA
Los siguientes items aplican solo a departamentos amoblados (UF + IVA):
- Cama 2 Plazas
- Velador
DECIMO SEGUNDO: Domicilio
_________________________________
DECLARACION DE SALUD
Declaro estar sano.
DECLARACION DE INGRESOS
Declaro ingresos.
DECLARACION DE ORIGEN DE FONDOS
Declaro fondos.
";

fn lines(src: &str) -> Vec<String> {
    src.lines().map(str::to_string).collect()
}

fn pipeline_in(dir: &Path) -> CompilationPipeline {
    let profile = BuildProfile {
        source: PathBuf::from("templates/contrato.txt"),
        output: PathBuf::from("templates/contrato.docx"),
        logo: Some(PathBuf::from("assets/logo.png")),
        ..BuildProfile::default()
    };
    CompilationPipeline::new(profile, dir)
}

fn read_part(bytes: &[u8], name: &str) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut file = archive.by_name(name).unwrap();
    let mut out = String::new();
    file.read_to_string(&mut out).unwrap();
    out
}

#[test]
fn invariant_every_line_classified_once() {
    let src = lines(CONTRACT);
    let classified = Assembler::default().classify_all(&src);

    let consumed: usize = classified.iter().map(|c| c.consumed).sum();
    assert_eq!(consumed, src.len());

    let mut expected_index = 0;
    for line in &classified {
        assert_eq!(line.index, expected_index);
        expected_index += line.consumed;
    }
}

#[test]
fn invariant_normalizer_idempotent() {
    for line in CONTRACT.lines() {
        let once = normalize_spanish_text(line);
        assert_eq!(normalize_spanish_text(&once), once);
    }
}

#[test]
fn invariant_declaration_pages() {
    let assembly = Assembler::default().assemble(&lines(CONTRACT), PageLayout::default());
    let declarations: Vec<_> = assembly
        .lines
        .iter()
        .filter_map(|line| match line.kind {
            LineKind::DeclarationHeading { page_break_before } => Some(page_break_before),
            _ => None,
        })
        .collect();

    assert_eq!(declarations, vec![false, true, true]);
    assert_eq!(assembly.state.declaration_count, declarations.len());

    let breaks = assembly
        .document
        .paragraphs()
        .filter(|p| p.format.page_break_before)
        .count();
    assert_eq!(breaks, 2);
}

#[test]
fn invariant_table_row_counts() {
    let assembly = Assembler::default().assemble(&lines(CONTRACT), PageLayout::default());
    let rows: Vec<_> = assembly.document.tables().map(|t| t.row_count()).collect();
    assert_eq!(rows, vec![25, 15]);
}

#[test]
fn invariant_price_marker_title_then_table() {
    let src = lines(&format!("{}\n- Aseo General Basico: 1,145 UF + IVA\n", PRICE_TABLE_MARKER));
    let assembly = Assembler::default().assemble(&src, PageLayout::default());

    assert_eq!(assembly.lines.len(), 1);
    assert_eq!(assembly.lines[0].consumed, 2);
    match assembly.document.blocks.as_slice() {
        [Block::Paragraph(title), Block::Table(table)] => {
            assert_eq!(title.text(), PRICE_TABLE_MARKER);
            assert_eq!(table.row_count(), 25);
        }
        other => panic!("unexpected blocks: {:?}", other),
    }
}

#[test]
fn invariant_account_field_runs() {
    let assembly = Assembler::default().assemble(&lines("Titular: Juan Pérez"), PageLayout::default());
    let paragraph = assembly.document.paragraphs().next().unwrap();
    assert_eq!(
        paragraph.runs,
        vec![
            Run::Text { text: "Titular:".to_string(), style: RunStyle::bold() },
            Run::Text { text: " Juan Pérez".to_string(), style: RunStyle::plain() },
        ]
    );
}

#[test]
fn invariant_no_leading_blank_paragraph() {
    for src in ["\nCONTRATO DE ARRENDAMIENTO", "\nTexto", CONTRACT] {
        let assembly = Assembler::default().assemble(&lines(src), PageLayout::default());
        match assembly.document.blocks.first() {
            Some(Block::Paragraph(first)) => assert!(!first.is_blank()),
            other => panic!("unexpected first block: {:?}", other),
        }
    }
}

#[test]
fn invariant_placeholders_pass_through() {
    let assembly = Assembler::default().assemble(&lines(CONTRACT), PageLayout::default());
    let text: String = assembly.document.paragraphs().map(|p| p.text()).collect();
    assert!(text.contains("[[ARRENDATARIO.RUT]]"));
    assert!(text.contains("[[ARRENDADORA.CUENTA.NUMERO]]"));
    assert!(text.contains("cédula nacional de identidad"));
}

#[test]
fn invariant_missing_source_fails_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline_in(dir.path());
    let err = pipeline.build().unwrap_err();
    assert!(matches!(err, BuildError::SourceNotFound(_)));
    assert!(err.to_string().contains("Template source not found"));
    assert!(!pipeline.output_path().exists());
}

#[test]
fn invariant_build_produces_docx() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("templates")).unwrap();
    fs::write(dir.path().join("templates/contrato.txt"), CONTRACT).unwrap();

    let pipeline = pipeline_in(dir.path());
    let compiled = pipeline.build().unwrap();
    let bytes = fs::read(pipeline.output_path()).unwrap();
    assert_eq!(bytes, compiled.bytes);

    let document = read_part(&bytes, "word/document.xml");
    assert!(document.contains("CONTRATO DE ARRENDAMIENTO"));
    assert!(document.contains("UNIDAD DE ANÁLISIS FINANCIERO"));
    assert_eq!(document.matches("<w:tblHeader/>").count(), 2);
    assert_eq!(document.matches("<w:pageBreakBefore/>").count(), 2);
    assert!(document.contains(r#"<w:pgMar w:top="1417" w:right="1417" w:bottom="1417" w:left="1417" w:header="567""#));

    let styles = read_part(&bytes, "word/styles.xml");
    assert!(styles.contains(r#"w:ascii="Times New Roman""#));

    assert_eq!(compiled.manifest.stats.tables, 2);
    assert_eq!(compiled.manifest.stats.declarations, 3);
    assert_eq!(
        compiled.manifest.placeholders,
        vec![
            "ARRENDADORA.RAZON_SOCIAL",
            "ARRENDATARIO.NOMBRE",
            "ARRENDATARIO.RUT",
            "ARRENDADORA.CUENTA.NUMERO",
        ]
    );
}

#[test]
fn invariant_logo_embedded_when_present() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("templates")).unwrap();
    fs::create_dir_all(dir.path().join("assets")).unwrap();
    fs::write(dir.path().join("templates/contrato.txt"), CONTRACT).unwrap();
    image::RgbImage::new(64, 16)
        .save(dir.path().join("assets/logo.png"))
        .unwrap();

    let compiled = pipeline_in(dir.path()).compile().unwrap();
    assert_eq!(compiled.document.media.len(), 1);

    let document = read_part(&compiled.bytes, "word/document.xml");
    assert!(!document.contains("UNIDAD DE ANÁLISIS FINANCIERO"));
    assert!(document.contains(r#"<wp:extent cx="2304000" cy="576000"/>"#));
    let rels = read_part(&compiled.bytes, "word/_rels/document.xml.rels");
    assert!(rels.contains("media/image1.png"));
    assert!(!rels.contains("media/image2.png"));
    assert_eq!(document.matches(r#"r:embed="rId2""#).count(), 3);

    let archive = zip::ZipArchive::new(Cursor::new(compiled.bytes.as_slice())).unwrap();
    let media = archive.file_names().filter(|n| n.starts_with("word/media/")).count();
    assert_eq!(media, 1);
}

#[test]
fn invariant_job_hash_stable() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline_in(dir.path());

    let first = pipeline.compile_source(CONTRACT).unwrap();
    let second = pipeline.compile_source(CONTRACT).unwrap();

    assert_eq!(first.manifest.job_hash, second.manifest.job_hash);
    assert_eq!(first.manifest.output_hash, second.manifest.output_hash);
    assert_eq!(first.bytes, second.bytes);
    assert_ne!(first.manifest.id, second.manifest.id);

    let changed = pipeline.compile_source(&CONTRACT.replace("sano", "enfermo")).unwrap();
    assert_ne!(first.manifest.job_hash, changed.manifest.job_hash);
}

#[test]
fn invariant_empty_template_is_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = CompilationPipeline::new(BuildProfile::default(), dir.path());
    let compiled = pipeline.compile_source("").unwrap();
    assert!(compiled.document.blocks.is_empty());
    assert!(compiled.manifest.lint.valid);

    let whitespace = pipeline.compile_source("\n   \n").unwrap();
    assert_eq!(whitespace.manifest.lint.violations[0].rule, "empty_template");
}

#[test]
fn invariant_lint_blocks_empty_template_when_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut profile = pipeline_in(dir.path()).profile().clone();
    profile.lint.reject_empty = true;
    let strict = CompilationPipeline::new(profile.clone(), dir.path());
    let err = strict.compile_source("\n   \n").unwrap_err();
    assert!(matches!(err, BuildError::LintFailed(_)));

    profile.lint.failure_mode = FailureMode::Log;
    let lenient = CompilationPipeline::new(profile, dir.path());
    assert!(lenient.compile_source("\n   \n").is_ok());
}

#[test]
fn invariant_manifest_canonical_json_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let compiled = pipeline_in(dir.path()).compile_source(CONTRACT).unwrap();

    let mut manifest = compiled.manifest.clone();
    manifest.manifest_hash = String::new();
    let c1 = canonical_json(&manifest).unwrap();
    let c2 = canonical_json(&serde_json::to_value(&manifest).unwrap()).unwrap();
    assert_eq!(c1, c2);
    assert_eq!(
        leasedoc_core::compute_manifest_hash(&manifest).unwrap(),
        compiled.manifest.manifest_hash
    );
}

#[cfg(feature = "test-hooks")]
#[test]
fn invariant_compile_always_lints() {
    use leasedoc_core::pipeline::{get_lint_call_count, reset_lint_call_count};

    reset_lint_call_count();
    let dir = tempfile::tempdir().unwrap();
    pipeline_in(dir.path()).compile_source(CONTRACT).unwrap();
    assert!(get_lint_call_count() >= 1);
}
