use anyhow::{Context, Result};
use log::info;
use prop_common::{CoordMemory, NamedPosition, OutputFormat, Snapshot};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// Writes all recorded snapshots in the requested format and returns the file path.
pub fn save_snapshots(snapshots: &[Snapshot], base_filename: &str, format: OutputFormat) -> Result<PathBuf> {
    let (extension, label) = match format {
        OutputFormat::Json | OutputFormat::Raw => ("json", "JSON"),
        OutputFormat::Bincode => ("bin", "binary format"),
        OutputFormat::Messagepack => ("msgpack", "MessagePack format"),
    };
    let filename = PathBuf::from(format!("{}_snapshots.{}", base_filename, extension));
    let file = File::create(&filename)
        .with_context(|| format!("Error creating snapshot file '{}'", filename.display()))?;
    let mut writer = BufWriter::new(file);

    match format {
        OutputFormat::Json | OutputFormat::Raw => serde_json::to_writer(&mut writer, snapshots)
            .context("Error serializing snapshots to JSON")?,
        OutputFormat::Bincode => bincode::serialize_into(&mut writer, snapshots)
            .context("Error serializing snapshots to bincode")?,
        OutputFormat::Messagepack => rmp_serde::encode::write(&mut writer, snapshots)
            .context("Error serializing snapshots to MessagePack")?,
    }
    writer.flush()?;

    info!("{} snapshots saved to {} ({})", snapshots.len(), filename.display(), label);
    Ok(filename)
}

/// Dumps the coordinate buffer as raw native-endian `f32` values.
pub fn save_memory_dump(memory: &CoordMemory, base_filename: &str) -> Result<PathBuf> {
    let filename = PathBuf::from(format!("{}_memory.f32", base_filename));
    std::fs::write(&filename, memory.as_bytes())
        .with_context(|| format!("Error writing memory dump '{}'", filename.display()))?;
    info!("Memory dump ({} pages) saved to {}", memory.pages(), filename.display());
    Ok(filename)
}

/// Writes the final live positions as CSV with a `name,x,y` header.
pub fn save_final_positions(positions: &[NamedPosition], base_filename: &str) -> Result<PathBuf> {
    let filename = PathBuf::from(format!("{}_final_positions.csv", base_filename));
    let mut writer = csv::Writer::from_path(&filename)
        .with_context(|| format!("Error saving CSV file '{}'", filename.display()))?;
    writer.write_record(["name", "x", "y"])?;
    for p in positions {
        writer.write_record([p.name.clone(), format!("{:.4}", p.x), format!("{:.4}", p.y)])?;
    }
    writer.flush()?;
    info!("Final positions saved to {}", filename.display());
    Ok(filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use prop_common::TrackedDistance;
    use std::fs;

    fn base(name: &str) -> String {
        let dir = std::env::temp_dir().join(format!("prop-engine-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir.join(name).to_string_lossy().into_owned()
    }

    fn snapshots() -> Vec<Snapshot> {
        vec![Snapshot {
            iteration: 3,
            positions: vec![NamedPosition { name: "pos".into(), x: 4.0, y: 6.0 }],
            distances: vec![TrackedDistance { from: "pos".into(), to: "gone".into(), distance: None }],
        }]
    }

    #[test]
    fn snapshots_read_back_in_every_format() {
        let json = save_snapshots(&snapshots(), &base("json"), OutputFormat::Json).unwrap();
        let back: Vec<Snapshot> = serde_json::from_reader(File::open(json).unwrap()).unwrap();
        assert_eq!(back[0].positions, snapshots()[0].positions);

        let bin = save_snapshots(&snapshots(), &base("bin"), OutputFormat::Bincode).unwrap();
        assert!(bin.to_string_lossy().ends_with("_snapshots.bin"));
        let back: Vec<Snapshot> = bincode::deserialize_from(File::open(bin).unwrap()).unwrap();
        assert_eq!(back[0].iteration, 3);
        assert_eq!(back[0].distances, snapshots()[0].distances);

        let mp = save_snapshots(&snapshots(), &base("mp"), OutputFormat::Messagepack).unwrap();
        let back: Vec<Snapshot> = rmp_serde::from_read(File::open(mp).unwrap()).unwrap();
        assert_eq!(back[0].positions[0].x, 4.0);
    }

    #[test]
    fn non_finite_values_survive_json_and_bincode() {
        let snapshot = Snapshot {
            iteration: 1,
            positions: vec![NamedPosition { name: "pos".into(), x: f32::INFINITY, y: f32::NEG_INFINITY }],
            distances: vec![
                TrackedDistance { from: "pos".into(), to: "nan".into(), distance: Some(f32::NAN) },
                TrackedDistance { from: "pos".into(), to: "gone".into(), distance: None },
            ],
        };

        for format in [OutputFormat::Json, OutputFormat::Bincode] {
            let path = save_snapshots(std::slice::from_ref(&snapshot), &base(&format!("inf-{:?}", format)), format).unwrap();
            let back: Vec<Snapshot> = match format {
                OutputFormat::Json => serde_json::from_reader(File::open(path).unwrap()).unwrap(),
                _ => bincode::deserialize_from(File::open(path).unwrap()).unwrap(),
            };
            assert_eq!(back[0].positions, snapshot.positions);
            assert!(back[0].distances[0].distance.unwrap().is_nan());
            assert_eq!(back[0].distances[1].distance, None);
        }
    }

    #[test]
    fn final_positions_csv() {
        let path = save_final_positions(&snapshots()[0].positions, &base("final")).unwrap();
        let text = fs::read_to_string(path).unwrap();
        assert_eq!(text, "name,x,y\npos,4.0000,6.0000\n");
    }

    #[test]
    fn memory_dump_is_whole_buffer() {
        let mut memory = CoordMemory::new();
        memory.write_block(1.0, 2.0);
        let path = save_memory_dump(&memory, &base("dump")).unwrap();
        let bytes = fs::read(path).unwrap();
        assert_eq!(bytes.len(), memory.capacity() * 4);
        assert_eq!(&bytes[4..8], &2.0f32.to_ne_bytes());
    }
}
