use std::io::{BufReader, BufWriter, Read, Write};
use std::{env, fs, path::PathBuf};

use anyhow::{bail, Context};
use ndarray::Array1;
use ort::{GraphOptimizationLevel, Session};

use rvc::{f0::rmvpe::Rmvpe, PitchEstimator};
use rvc_common::{config::PitchConfig, enums::PitchAlgorithm};

fn read_u32(reader: &mut impl Read) -> std::io::Result<u32> {
    let mut bytes = [0u8; 4];
    reader.read_exact(&mut bytes)?;
    Ok(u32::from_le_bytes(bytes))
}

fn write_frame(writer: &mut impl Write, values: &[f32]) -> std::io::Result<()> {
    let output_bytes: Vec<u8> = values.iter().flat_map(|&x| x.to_le_bytes()).collect();
    writer.write_all(&(output_bytes.len() as u32).to_le_bytes())?;
    writer.write_all(&output_bytes)?;
    writer.flush()
}

fn load_config(path: Option<&String>) -> anyhow::Result<PitchConfig> {
    let config = match path {
        Some(path) => {
            let text = fs::read_to_string(path).with_context(|| format!("reading {}", path))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path))?
        }
        None => PitchConfig::default(),
    };
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::fmt().with_writer(std::io::stderr).init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        bail!("Usage: rvc-f0-rpc <model.onnx> <onnxruntime library> [config.json]");
    }

    let model_path = PathBuf::from(&args[1]);
    let ort_path = PathBuf::from(&args[2]);
    let base_config = load_config(args.get(3))?;
    base_config.validate()?;

    ort::init_from(ort_path.to_string_lossy())
        .commit()
        .context("loading onnxruntime")?;
    let session = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .commit_from_file(&model_path)
        .with_context(|| format!("loading {}", model_path.display()))?;

    let mut estimator = PitchEstimator::new(Rmvpe::new(session), PitchAlgorithm::Rmvpe)?;

    let mut buffered_stdin = BufReader::with_capacity(1024 * 1024, std::io::stdin().lock());
    let mut buffered_stdout = BufWriter::with_capacity(1024 * 1024, std::io::stdout().lock());

    tracing::info!(model = %model_path.display(), "ready to receive input");

    loop {
        let input_bytes_length = match read_u32(&mut buffered_stdin) {
            Ok(length) => length as usize,
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                tracing::info!("input closed");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let mut input_bytes = vec![0u8; input_bytes_length];
        buffered_stdin.read_exact(&mut input_bytes)?;
        let input: Array1<f32> = input_bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();

        let sample_rate = read_u32(&mut buffered_stdin)? as usize;
        let target_frame_count = read_u32(&mut buffered_stdin)? as usize;

        let config = PitchConfig {
            target_frame_count: (target_frame_count > 0).then_some(target_frame_count),
            ..base_config.clone()
        };

        let start_time = std::time::Instant::now();
        let output = match estimator.estimate_pitch(input.view(), sample_rate, &config) {
            Ok(contour) => {
                tracing::debug!(frames = contour.len(), elapsed = ?start_time.elapsed(), "pitch request");
                contour.f0.to_vec()
            }
            Err(e) => {
                tracing::warn!(error = %e, samples = input.len(), sample_rate, "pitch request failed");
                Vec::new()
            }
        };

        write_frame(&mut buffered_stdout, &output)?;
    }
}
