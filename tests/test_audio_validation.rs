//! Integration test for spec §8 property 5: audio validation round-trip.

use podcast_digest::audio::validation::is_valid_audio_file;

async fn write_temp(name: &str, bytes: &[u8]) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(name);
    tokio::fs::write(&path, bytes).await.unwrap();
    path
}

#[tokio::test]
async fn known_signature_with_sufficient_size_passes() {
    let mut bytes = b"ID3".to_vec();
    bytes.extend(std::iter::repeat(0u8).take(2000));
    let path = write_temp("podcast-digest-valid.mp3", &bytes).await;
    assert!(is_valid_audio_file(&path).await.unwrap());
    let _ = tokio::fs::remove_file(&path).await;
}

#[tokio::test]
async fn html_error_page_fails_regardless_of_size() {
    let mut bytes = b"<!DOCTYPE html><html><body>Error 403</body></html>".to_vec();
    bytes.extend(std::iter::repeat(b' ').take(2000));
    let path = write_temp("podcast-digest-html-error.mp3", &bytes).await;
    assert!(!is_valid_audio_file(&path).await.unwrap());
    let _ = tokio::fs::remove_file(&path).await;
}

#[tokio::test]
async fn undersized_file_fails_even_with_valid_signature() {
    let bytes = b"ID3tiny".to_vec();
    let path = write_temp("podcast-digest-undersized.mp3", &bytes).await;
    assert!(!is_valid_audio_file(&path).await.unwrap());
    let _ = tokio::fs::remove_file(&path).await;
}
