use assert_cmd::prelude::*; // Add methods on commands
use predicates::prelude::*;
use std::io::Write;
use std::process::Command; // Run programs
use tempfile;

type STDRESULT = Result<(), Box<dyn std::error::Error>>;

fn round_trip(method: &str, page: &[u8]) -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("page.bin");
    let compressed_path = temp_dir.path().join("page.wk");
    let restored_path = temp_dir.path().join("page.out");
    std::fs::File::create(&in_path)?.write_all(page)?;

    Command::cargo_bin("wkcodec")?
        .arg("compress")
        .arg("-m").arg(method)
        .arg("-i").arg(&in_path)
        .arg("-o").arg(&compressed_path)
        .assert()
        .success();

    Command::cargo_bin("wkcodec")?
        .arg("expand")
        .arg("-m").arg(method)
        .arg("-i").arg(&compressed_path)
        .arg("-o").arg(&restored_path)
        .assert()
        .success();

    assert_eq!(std::fs::read(&restored_path)?, page);
    Ok(())
}

#[test]
fn wk_only_round_trips_an_all_zero_page() -> STDRESULT {
    round_trip("wk", &vec![0u8; 4096])
}

#[test]
fn wk_huffman_round_trips_a_repetitive_page() -> STDRESULT {
    let mut page = Vec::with_capacity(4096);
    while page.len() < 4096 {
        page.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF, 0, 0, 0, 0]);
    }
    round_trip("wk-huffman", &page)
}

#[test]
fn wk_huffman_round_trips_mixed_content() -> STDRESULT {
    let mut page = Vec::with_capacity(4096);
    for i in 0..512u64 {
        let word = if i % 5 == 0 { 0 } else { i.wrapping_mul(0x9E3779B97F4A7C15) % (1 << 40) };
        page.extend_from_slice(&word.to_le_bytes());
    }
    round_trip("wk-huffman", &page)
}

#[test]
fn compress_rejects_non_power_of_two_dict_size() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("page.bin");
    let out_path = temp_dir.path().join("page.wk");
    std::fs::File::create(&in_path)?.write_all(&vec![0u8; 64])?;

    Command::cargo_bin("wkcodec")?
        .arg("compress")
        .arg("-m").arg("wk")
        .arg("-i").arg(&in_path)
        .arg("-o").arg(&out_path)
        .arg("-d").arg("15")
        .assert()
        .failure()
        .stderr(predicate::str::contains("power of two"));
    Ok(())
}

#[test]
fn histogram_prints_a_row_per_dictionary_slot() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("page.bin");
    let compressed_path = temp_dir.path().join("page.wk");
    std::fs::File::create(&in_path)?.write_all(&vec![0u8; 4096])?;

    Command::cargo_bin("wkcodec")?
        .arg("compress")
        .arg("-m").arg("wk")
        .arg("-i").arg(&in_path)
        .arg("-o").arg(&compressed_path)
        .assert()
        .success();

    Command::cargo_bin("wkcodec")?
        .arg("histogram")
        .arg("-i").arg(&compressed_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("0\t"));
    Ok(())
}
