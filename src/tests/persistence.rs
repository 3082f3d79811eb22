// src/tests/persistence.rs
// Ensemble files: compact round trip, rejection of damaged files, readable dumps.

use std::path::PathBuf;

use crate::gauge::metropolis::{GaugeMetropolis, SamplerState};
use crate::gauge::persistence::{read_compact, write_compact};
use crate::gauge::settings::{SamplerSettings, SeedPolicy};
use crate::LatticeError;

fn temp_file(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!("lgmc_{tag}_{}.dat", std::process::id()))
}

fn sampled() -> GaugeMetropolis {
    let settings = SamplerSettings {
        grid: [2, 2, 2, 2],
        nof_su3: 8,
        ncorr: 1,
        inner_cycles: 3,
        ncf: 2,
        improved: true,
        seed: SeedPolicy::Fixed(99),
        ..SamplerSettings::default()
    };
    let mut sampler = GaugeMetropolis::from_settings(settings).unwrap();
    sampler.run().unwrap();
    sampler
}

#[test]
fn compact_round_trip_is_bit_identical() {
    let sampler = sampled();
    let path = temp_file("roundtrip");
    sampler.save(&path).unwrap();

    let loaded = GaugeMetropolis::load(&path).unwrap();
    assert_eq!(loaded.state(), SamplerState::Uninitialized);
    assert_eq!(loaded.ensemble(), sampler.ensemble());
    assert_eq!(loaded.grid(), sampler.grid());
    assert_eq!(loaded.ncorr(), 1);
    assert_eq!(loaded.ncf(), 2);
    assert!(loaded.is_improved());
    assert_eq!(loaded.beta_tilde().to_bits(), sampler.beta_tilde().to_bits());
    assert_eq!(loaded.u0().to_bits(), sampler.u0().to_bits());
    assert_eq!(loaded.epsilon().to_bits(), sampler.epsilon().to_bits());
    assert_eq!(loaded.spacing().to_bits(), sampler.spacing().to_bits());
    assert_eq!(loaded.settings().seed, SeedPolicy::Entropy);

    let raw: Vec<u64> = loaded.ensemble()[1]
        .as_slice()
        .iter()
        .flat_map(|z| [z.re.to_bits(), z.im.to_bits()])
        .collect();
    let orig: Vec<u64> = sampler.ensemble()[1]
        .as_slice()
        .iter()
        .flat_map(|z| [z.re.to_bits(), z.im.to_bits()])
        .collect();
    assert_eq!(raw, orig);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn truncated_file_is_a_parse_error() {
    let sampler = sampled();
    let path = temp_file("truncated");
    sampler.save(&path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    std::fs::write(&path, &text[..text.len() * 3 / 4]).unwrap();

    assert!(matches!(read_compact(&path), Err(LatticeError::Parse(_))));
    let _ = std::fs::remove_file(&path);
}

#[test]
fn bad_header_is_a_parse_error() {
    let path = temp_file("header");
    std::fs::write(&path, "10\n1\n2\n1\n0.25\n5.5\n1.7\n0.8\n0.24\nmaybe\n2 2 2 2\n").unwrap();
    assert!(matches!(read_compact(&path), Err(LatticeError::Parse(_))));

    std::fs::write(&path, "10\n1\n2\n0\n0.25\n5.5\n1.7\n0.8\n0.24\ntrue\n2 0 2 2\n").unwrap();
    assert!(matches!(read_compact(&path), Err(LatticeError::Parse(_))));

    std::fs::write(&path, "10\n1\n2\n0\n0.25\n5.5\n1.7\n0.8\n0.24\ntrue\n2 2 2 2\n").unwrap();
    let (settings, ensemble) = read_compact(&path).unwrap();
    assert!(settings.improved);
    assert!(ensemble.is_empty());
    let _ = std::fs::remove_file(&path);
}

#[test]
fn oversized_header_counts_are_parse_errors() {
    let path = temp_file("oversized");
    let header = "10\n1\n2\n1\n0.25\n5.5\n1.7\n0.8\n0.24\n0\n";
    std::fs::write(&path, format!("{header}100000 100000 100000 100000\n1e0 0e0\n")).unwrap();
    assert!(matches!(read_compact(&path), Err(LatticeError::Parse(_))));

    let huge_ncf = format!(
        "10\n1\n2\n{}\n0.25\n5.5\n1.7\n0.8\n0.24\n0\n1000 1000 1000 1000\n1e0 0e0\n",
        usize::MAX
    );
    std::fs::write(&path, huge_ncf).unwrap();
    assert!(matches!(read_compact(&path), Err(LatticeError::Parse(_))));
    let _ = std::fs::remove_file(&path);
}

#[test]
fn writer_rejects_inconsistent_ensemble() {
    let sampler = sampled();
    let mut settings = sampler.settings().clone();
    settings.ncf = 3;
    let path = temp_file("inconsistent");
    assert!(matches!(
        write_compact(&path, &settings, sampler.ensemble()),
        Err(LatticeError::InvalidParameters(_))
    ));
}

#[test]
fn readable_dumps_have_one_line_per_element() {
    let sampler = sampled();
    let elements = 16 * 4 * 9;

    let verbose = temp_file("verbose");
    sampler.save_verbose(&verbose).unwrap();
    let text = std::fs::read_to_string(&verbose).unwrap();
    assert_eq!(text.lines().count(), 15 + 2 * elements);
    assert!(text.lines().nth(15).unwrap().starts_with("0; (0, 0, 0, 0, 0), (0, 0), "));

    let dump = temp_file("dump");
    sampler.dump_current(&dump).unwrap();
    let text = std::fs::read_to_string(&dump).unwrap();
    assert_eq!(text.lines().count(), elements);
    let first: Vec<_> = text.lines().next().unwrap().split_whitespace().collect();
    assert_eq!(first.len(), 9);
    assert_eq!(&first[..7], ["0", "0", "0", "0", "0", "0", "0"]);

    let _ = std::fs::remove_file(&verbose);
    let _ = std::fs::remove_file(&dump);
}
