use std::{
    fs::{self, File},
    io::{self, Write},
    path::Path,
    thread::sleep,
    time::Duration,
};

use anyhow::{Context, Result};
use tracing::warn;
use ureq::Agent;

use crate::utils::progress_bar;

use super::database::{local_file, LogoDatabase};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DownloadStats {
    pub downloaded: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Stream `url` into `path`. A failed download leaves no file behind.
pub fn download_logo(agent: &Agent, url: &str, path: &Path, timeout: Duration) -> Result<()> {
    let result = fetch(agent, url, path, timeout);
    if result.is_err() && path.exists() {
        if let Err(e) = fs::remove_file(path) {
            warn!("Failed to remove partial download {}: {e}", path.display());
        }
    }
    result.with_context(|| format!("Download failed: {url}"))
}

fn fetch(agent: &Agent, url: &str, path: &Path, timeout: Duration) -> Result<()> {
    let response = agent.get(url).timeout(timeout).call()?;
    let mut file = File::create(path)?;
    io::copy(&mut response.into_reader(), &mut file)?;
    file.flush()?;
    Ok(())
}

/// Fetch every logo in `database` that isn't already in `dir`. Existing files
/// are never touched, so rerunning only picks up what is missing.
pub fn download_all(
    agent: &Agent,
    database: &LogoDatabase,
    dir: &Path,
    timeout: Duration,
    delay: Duration,
) -> DownloadStats {
    let mut stats = DownloadStats::default();
    let pb = progress_bar(database.len() as u64);

    for (brand, entry) in database {
        pb.inc(1);
        let path = dir.join(local_file(brand));
        if path.exists() {
            pb.suspend(|| println!("  Skipped (exists): {brand}"));
            stats.skipped += 1;
            continue;
        }

        pb.set_message(brand.clone());
        match download_logo(agent, &entry.url, &path, timeout) {
            Ok(()) => {
                pb.suspend(|| println!("  Downloaded: {brand}"));
                stats.downloaded += 1;
                sleep(delay);
            }
            Err(e) => {
                pb.suspend(|| warn!("{brand}: {e:#}"));
                stats.failed += 1;
            }
        }
    }

    pb.finish_and_clear();
    stats
}

#[cfg(test)]
mod tests {
    use std::{
        io::{BufRead, BufReader},
        net::TcpListener,
        thread,
    };

    use super::*;
    use crate::logos::database::LogoEntry;

    // nothing listens on the discard port, so any request fails fast
    const DEAD_URL: &str = "http://127.0.0.1:9/logo.png";

    fn database(brands: &[&str]) -> LogoDatabase {
        brands
            .iter()
            .map(|brand| {
                (
                    brand.to_string(),
                    LogoEntry {
                        chain: brand.to_string(),
                        url: DEAD_URL.to_string(),
                        location_count: 1,
                        examples: vec![brand.to_string()],
                    },
                )
            })
            .collect()
    }

    #[test]
    fn existing_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let database = database(&["Road Ranger", "Shell"]);
        for brand in database.keys() {
            fs::write(dir.path().join(local_file(brand)), brand).unwrap();
        }

        for _ in 0..2 {
            let stats = download_all(
                &Agent::new(),
                &database,
                dir.path(),
                Duration::from_secs(1),
                Duration::ZERO,
            );
            assert_eq!(
                stats,
                DownloadStats {
                    downloaded: 0,
                    failed: 0,
                    skipped: 2
                }
            );
        }
        assert_eq!(
            fs::read_to_string(dir.path().join("road_ranger.png")).unwrap(),
            "Road Ranger"
        );
    }

    #[test]
    fn failed_download_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let stats = download_all(
            &Agent::new(),
            &database(&["Shell"]),
            dir.path(),
            Duration::from_secs(1),
            Duration::ZERO,
        );
        assert_eq!(stats.failed, 1);
        assert!(!dir.path().join("shell.png").exists());
    }

    #[test]
    fn truncated_body_removes_partial_file() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/logo.png", listener.local_addr().unwrap());
        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            while reader.read_line(&mut line).unwrap() > 2 {
                line.clear();
            }
            stream
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 1000\r\n\r\npartial")
                .unwrap();
        });

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shell.png");
        let result = download_logo(&Agent::new(), &url, &path, Duration::from_secs(5));
        server.join().unwrap();

        assert!(result.is_err());
        assert!(!path.exists());
    }
}
