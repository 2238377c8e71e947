//! Sample corpus seeder.
//!
//! Writes four synthetic genomic profiling reports into the data directory
//! as single-page PDFs, one per patient. Existing files are never
//! overwritten, so the command is safe to re-run after editing a report by
//! hand.

use anyhow::{Context, Result};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::path::{Path, PathBuf};

use crate::config::Config;

struct Alteration {
    gene: &'static str,
    vaf: &'static str,
    significance: &'static str,
}

struct Patient {
    id: &'static str,
    name: &'static str,
    dob: &'static str,
    gender: &'static str,
    history: &'static str,
    pathology: &'static str,
    alterations: &'static [Alteration],
    treatment_logic: &'static str,
    drug: &'static str,
    alt_drug: &'static str,
}

static SAMPLE_PATIENTS: &[Patient] = &[
    Patient {
        id: "001",
        name: "Chang, Wei-Ming",
        dob: "1965-04-12",
        gender: "Male",
        history: "Smoking (20 pack-years). Persistent cough.",
        pathology: "Lung Adenocarcinoma. Staging: cT2aN2M0, IIIA.",
        alterations: &[
            Alteration {
                gene: "EGFR Exon 19 Deletion",
                vaf: "28%",
                significance: "Pathogenic. Sensitizing for EGFR TKIs.",
            },
            Alteration {
                gene: "TP53 R273C",
                vaf: "15%",
                significance: "Pathogenic.",
            },
            Alteration {
                gene: "PD-L1 Expression (TPS)",
                vaf: "45%",
                significance: "Moderate expression.",
            },
        ],
        treatment_logic: "EGFR Exon 19 Deletion indicates high sensitivity to EGFR-TKIs.",
        drug: "Osimertinib (Tagrisso) 80mg daily.",
        alt_drug: "Gefitinib or Erlotinib",
    },
    Patient {
        id: "002",
        name: "Lee, Shu-Fen",
        dob: "1978-08-23",
        gender: "Female",
        history: "Heavy smoker. Routine CXR revealed mass.",
        pathology: "Lung Adenocarcinoma. Staging: cT3N1M0, IIIB.",
        alterations: &[
            Alteration {
                gene: "KRAS G12C",
                vaf: "32%",
                significance: "Pathogenic. Predicts response to KRAS G12C inhibitors.",
            },
            Alteration {
                gene: "STK11 Mutation",
                vaf: "18%",
                significance: "Pathogenic.",
            },
        ],
        treatment_logic: "KRAS G12C mutation identified. NCCN recommends targeted therapy.",
        drug: "Sotorasib (Lumakras) 960mg daily.",
        alt_drug: "Adagrasib",
    },
    Patient {
        id: "003",
        name: "Wang, Da-Wei",
        dob: "1982-11-05",
        gender: "Male",
        history: "Never-smoker. Chest pain.",
        pathology: "Lung Adenocarcinoma. Staging: Stage IV (Brain mets).",
        alterations: &[Alteration {
            gene: "EML4-ALK Fusion",
            vaf: "Fish Positive",
            significance: "Pathogenic. Highly sensitive to ALK inhibitors.",
        }],
        treatment_logic: "ALK Rearrangement is a potent driver.",
        drug: "Alectinib (Alecensa) 600mg BID.",
        alt_drug: "Brigatinib",
    },
    Patient {
        id: "004",
        name: "Chen, Mei-Ling",
        dob: "1980-02-14",
        gender: "Female",
        history: "Family history of breast cancer (Mother). Palpable lump in left breast.",
        pathology: "Invasive Ductal Carcinoma. ER-, PR-, HER2- (Triple Negative). Stage IIB.",
        alterations: &[
            Alteration {
                gene: "BRCA1 c.68_69delAG",
                vaf: "Germline",
                significance:
                    "Pathogenic. Associated with Hereditary Breast and Ovarian Cancer syndrome.",
            },
            Alteration {
                gene: "TP53 Mutation",
                vaf: "40%",
                significance: "Pathogenic.",
            },
        ],
        treatment_logic: "Patient has germline BRCA1 mutation and HER2-negative breast cancer.",
        drug: "Olaparib (Lynparza) (PARP Inhibitor)",
        alt_drug: "Talazoparib (Talzenna)",
    },
];

/// Seed the configured data directory with the sample reports. Returns the
/// paths that were newly created; files already on disk are skipped.
pub fn run_seed(config: &Config) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(&config.data.path).with_context(|| {
        format!(
            "Failed to create data directory {}",
            config.data.path.display()
        )
    })?;

    let mut created = Vec::new();
    for patient in SAMPLE_PATIENTS {
        let file_path = config
            .data
            .path
            .join(format!("patient_report_{}.pdf", patient.id));
        if file_path.exists() {
            println!("[skipped] {} already exists", file_path.display());
            continue;
        }
        write_report(&file_path, patient)
            .with_context(|| format!("Failed to write {}", file_path.display()))?;
        println!("[created] {}", file_path.display());
        created.push(file_path);
    }
    Ok(created)
}

/// Flatten a patient record into the text lines that make up the report
/// page, top to bottom.
fn report_lines(patient: &Patient) -> Vec<String> {
    let mut lines = vec![
        "CONFIDENTIAL MEDICAL REPORT".to_string(),
        "ACT Genomics - Precision Medicine Center".to_string(),
        String::new(),
        format!("Patient Name: {}", patient.name),
        format!("Patient ID: ACT-2024-{}", patient.id),
        format!("DOB: {} ({})", patient.dob, patient.gender),
        String::new(),
        "--- CLINICAL HISTORY & PATHOLOGY ---".to_string(),
        format!("History: {}", patient.history),
        format!("Diagnosis: {}", patient.pathology),
        String::new(),
        "--- DETECTED GENOMIC ALTERATIONS ---".to_string(),
    ];
    for (i, alt) in patient.alterations.iter().enumerate() {
        lines.push(format!("{}. {}", i + 1, alt.gene));
        lines.push(format!("   VAF/Type: {}", alt.vaf));
        lines.push(format!("   Significance: {}", alt.significance));
    }
    lines.push(String::new());
    lines.push("--- TREATMENT RECOMMENDATIONS ---".to_string());
    lines.push(patient.treatment_logic.to_string());
    lines.push(format!("Recommended: {}", patient.drug));
    lines.push(format!("Alternative: {}", patient.alt_drug));
    lines
}

/// Emit a single-page letter-size PDF with one Helvetica text column.
fn write_report(path: &Path, patient: &Patient) -> Result<()> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), 10.into()]),
        Operation::new("TL", vec![14.into()]),
        Operation::new("Td", vec![72.into(), 750.into()]),
    ];
    for line in report_lines(patient) {
        operations.push(Operation::new("Tj", vec![Object::string_literal(line)]));
        operations.push(Operation::new("T*", vec![]));
    }
    operations.push(Operation::new("ET", vec![]));

    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    doc.save(path)?;
    Ok(())
}
