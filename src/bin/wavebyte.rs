//! wavebyte CLI - encode, decode and inspect scalable wavelet image streams.
//!
//! Works on binary PGM (P5) and PPM (P6) images so it has no decoder
//! dependencies; any image toolchain can produce those.

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};

use wavebyte_rs::{
    decode, decode_header, encode, ColorMode, ImageDescriptor, ScanOrder, HEADER_SIZE,
};

/// Byte-granular scalable wavelet image codec
#[derive(Parser)]
#[command(name = "wavebyte")]
#[command(version)]
#[command(about = "Encode once, truncate anywhere", long_about = None)]
#[command(after_help = "EXAMPLES:
    wavebyte encode -i photo.ppm -o photo.wvb
    wavebyte encode -i photo.ppm -o photo.wvb -m oklab -s hilbert -b 20000
    wavebyte decode -i photo.wvb -o photo.ppm
    wavebyte decode -i photo.wvb -o preview.ppm -b 1024
    wavebyte info -i photo.wvb

The encoded stream may be cut at any byte count past the 6-byte header;
decoding the prefix yields the best image that many bytes can carry.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a PGM/PPM image into a wavebyte stream
    #[command(visible_alias = "e")]
    Encode {
        /// Input image (binary PGM or PPM, 8-bit)
        #[arg(short, long)]
        input: PathBuf,

        /// Output stream path
        #[arg(short, long)]
        output: PathBuf,

        /// Byte budget for the output; defaults to a lossless-sufficient
        /// size (pixel bytes + 25%)
        #[arg(short, long)]
        budget: Option<usize>,

        /// Internal color mode (grayscale input always uses grayscale)
        #[arg(short = 'm', long, default_value = "ycocg-r", value_enum)]
        mode: Mode,

        /// Coefficient scan order
        #[arg(short, long, default_value = "snake", value_enum)]
        scan: Scan,

        /// DWT decomposition levels (clamped to what the size supports)
        #[arg(short, long, default_value = "5")]
        levels: usize,

        /// Delay chroma bits by one extra round (acts as subsampling at
        /// low rates, free at high rates)
        #[arg(long)]
        subsampling: bool,
    },

    /// Decode a wavebyte stream (or a prefix of one) to PGM/PPM
    #[command(visible_alias = "d")]
    Decode {
        /// Input stream path
        #[arg(short, long)]
        input: PathBuf,

        /// Output image path (PGM for grayscale, PPM otherwise)
        #[arg(short, long)]
        output: PathBuf,

        /// Decode only the first N bytes, as if the file were truncated
        #[arg(short, long)]
        budget: Option<usize>,
    },

    /// Print the header of a wavebyte stream
    #[command(visible_alias = "i")]
    Info {
        /// Input stream path
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    Grayscale,
    YcocgR,
    Oklab,
    Logl1,
}

impl From<Mode> for ColorMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Grayscale => ColorMode::Grayscale,
            Mode::YcocgR => ColorMode::YCoCgR,
            Mode::Oklab => ColorMode::Oklab,
            Mode::Logl1 => ColorMode::LogL1,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Scan {
    Raster,
    Snake,
    Morton,
    Hilbert,
}

impl From<Scan> for ScanOrder {
    fn from(scan: Scan) -> Self {
        match scan {
            Scan::Raster => ScanOrder::Raster,
            Scan::Snake => ScanOrder::Snake,
            Scan::Morton => ScanOrder::Morton,
            Scan::Hilbert => ScanOrder::Hilbert,
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Encode {
            input,
            output,
            budget,
            mode,
            scan,
            levels,
            subsampling,
        } => encode_file(&input, &output, budget, mode, scan, levels, subsampling),
        Commands::Decode {
            input,
            output,
            budget,
        } => decode_file(&input, &output, budget),
        Commands::Info { input } => show_info(&input),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn encode_file(
    input: &Path,
    output: &Path,
    budget: Option<usize>,
    mode: Mode,
    scan: Scan,
    levels: usize,
    subsampling: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let (pixels, width, height, channels) = read_pnm(input)?;

    let color_mode = if channels == 1 {
        // A single-channel source has no chroma to transform.
        ColorMode::Grayscale
    } else {
        ColorMode::from(mode)
    };
    let mut descriptor = ImageDescriptor::new(
        width,
        height,
        levels,
        color_mode,
        ScanOrder::from(scan),
        subsampling,
    );

    let budget = match budget {
        Some(b) if b > HEADER_SIZE => b,
        _ => {
            let raw = descriptor.pixel_buffer_size();
            raw + raw / 4
        }
    };
    let mut compressed = vec![0u8; budget];
    let used = encode(&pixels, &mut compressed, &mut descriptor)?;
    fs::write(output, &compressed[..used])?;

    println!(
        "✓ Encoded {}x{} ({:?}, {:?}, {} levels) to {:?}: {} bytes",
        width, height, descriptor.color_mode, descriptor.scan_order, descriptor.dwt_levels,
        output, used
    );
    Ok(())
}

fn decode_file(
    input: &Path,
    output: &Path,
    budget: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut stream = fs::read(input)?;
    if let Some(budget) = budget {
        if budget > HEADER_SIZE && budget < stream.len() {
            stream.truncate(budget);
        }
    }

    let descriptor = decode_header(&stream)?;
    let mut pixels = vec![0u8; descriptor.pixel_buffer_size()];
    decode(&stream, &mut pixels)?;
    write_pnm(
        output,
        &pixels,
        descriptor.width,
        descriptor.height,
        descriptor.num_planes,
    )?;

    println!(
        "✓ Decoded {}x{} ({:?}) from {} bytes to {:?}",
        descriptor.width,
        descriptor.height,
        descriptor.color_mode,
        stream.len(),
        output
    );
    Ok(())
}

fn show_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let stream = fs::read(input)?;
    let descriptor = decode_header(&stream)?;

    println!("File:        {:?} ({} bytes)", input, stream.len());
    println!("Dimensions:  {}x{}", descriptor.width, descriptor.height);
    println!("Color mode:  {:?}", descriptor.color_mode);
    println!("Scan order:  {:?}", descriptor.scan_order);
    println!("DWT levels:  {}", descriptor.dwt_levels);
    println!("Planes:      {}", descriptor.num_planes);
    println!("Subsampling: {}", descriptor.subsampling);
    println!(
        "Decoded size: {} bytes ({} bpp at this file size)",
        descriptor.pixel_buffer_size(),
        (stream.len() * 8) as f64 / (descriptor.width * descriptor.height) as f64
    );
    Ok(())
}

// Minimal binary PGM/PPM support.

fn read_pnm(path: &Path) -> Result<(Vec<u8>, usize, usize, usize), Box<dyn std::error::Error>> {
    let data = fs::read(path)?;
    let channels = match data.get(..2) {
        Some(b"P5") => 1,
        Some(b"P6") => 3,
        _ => return Err("input must be a binary PGM (P5) or PPM (P6) image".into()),
    };

    // Header fields are whitespace-separated, with '#' comments.
    let mut pos = 2;
    let mut fields = [0usize; 3];
    for field in &mut fields {
        while pos < data.len() && (data[pos].is_ascii_whitespace() || data[pos] == b'#') {
            if data[pos] == b'#' {
                while pos < data.len() && data[pos] != b'\n' {
                    pos += 1;
                }
            } else {
                pos += 1;
            }
        }
        let start = pos;
        while pos < data.len() && data[pos].is_ascii_digit() {
            pos += 1;
        }
        *field = std::str::from_utf8(&data[start..pos])?.parse()?;
    }
    let [width, height, maxval] = fields;
    if maxval != 255 {
        return Err("only 8-bit PNM images are supported".into());
    }
    pos += 1; // single whitespace byte before the raster
    let size = width * height * channels;
    let pixels = data
        .get(pos..pos + size)
        .ok_or("truncated PNM raster")?
        .to_vec();
    Ok((pixels, width, height, channels))
}

fn write_pnm(
    path: &Path,
    pixels: &[u8],
    width: usize,
    height: usize,
    channels: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    use std::io::Write;
    let mut file = fs::File::create(path)?;
    if channels == 1 {
        writeln!(file, "P5")?;
    } else {
        writeln!(file, "P6")?;
    }
    writeln!(file, "{} {}", width, height)?;
    writeln!(file, "255")?;
    file.write_all(pixels)?;
    Ok(())
}
