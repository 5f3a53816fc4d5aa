// src/main.rs
// Example command-line application for Capture Reader

use std::env;
use std::fs;
use std::process;
use capture_reader::{
    CaptureDescriptor, GapFillingAccessor, RawBuffer, SampleAccessor, WaveformFormat,
};

fn print_usage() {
    eprintln!("Usage: capture_reader <command> <capture_file> <format> [options]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  info <file> <format> [offset scale [length]]              Display capture information");
    eprintln!("  convert <file> <format> <output> [offset scale [length]]  Decode capture to CSV");
    eprintln!("  extract <file> <format> <index> [offset scale [length]]   Print one decoded sample");
    eprintln!();
    eprintln!("Formats:");
    eprintln!("  packed-floats   tightly packed little-endian f32 samples");
    eprintln!("  byte-codes      one byte code per sample, value = offset + code*scale");
    eprintln!("  word-codes      one 16-bit code per sample, value = offset + code*scale");
    eprintln!("  csv             comma-separated text export");
    eprintln!("  stride-log      f32 samples at byte address offset + index*scale");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  capture_reader info capture.bin packed-floats");
    eprintln!("  capture_reader convert rigol.raw byte-codes output.csv -2.5 0.02");
    eprintln!("  capture_reader extract channel.dlog stride-log 100 24 16 50000");
}

fn parse_format(arg: &str) -> Option<WaveformFormat> {
    let format = match arg {
        "packed-floats" => WaveformFormat::PackedFloatBytes,
        "byte-codes" => WaveformFormat::ScaledByteCodes,
        "word-codes" => WaveformFormat::ScaledWordCodes,
        "csv" => WaveformFormat::CsvText,
        "stride-log" => WaveformFormat::VariableStrideLog,
        _ => {
            // Fall back to the numeric wire tag.
            let tag: u8 = arg.parse().ok()?;
            WaveformFormat::try_from(tag).ok()?
        }
    };

    // A float-array capture is an in-memory sequence with no file
    // representation, so the CLI cannot construct one.
    if format == WaveformFormat::FloatArray {
        return None;
    }

    Some(format)
}

/// Parse the trailing `[offset scale [length]]` arguments.
fn parse_decode_params(args: &[String]) -> (f64, f64, Option<usize>) {
    let offset = args.first().and_then(|a| a.parse().ok()).unwrap_or(0.0);
    let scale = args.get(1).and_then(|a| a.parse().ok()).unwrap_or(1.0);
    let length = args.get(2).and_then(|a| a.parse().ok());
    (offset, scale, length)
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 4 {
        print_usage();
        process::exit(1);
    }

    let command = &args[1];
    let input_file = &args[2];

    let format = match parse_format(&args[3]) {
        Some(f) => f,
        None => {
            eprintln!("Error: Unknown format '{}'", args[3]);
            print_usage();
            process::exit(1);
        }
    };

    // Load the capture file
    let buffer = match fs::read(input_file) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Error loading capture file '{}': {}", input_file, e);
            process::exit(1);
        }
    };

    match command.as_str() {
        "info" => {
            let (offset, scale, length) = parse_decode_params(&args[4..]);
            let accessor = decode_or_exit(format, &buffer, offset, scale, length);
            print_capture_info(input_file, &accessor, buffer.len());
        }

        "convert" => {
            if args.len() < 5 {
                eprintln!("Error: Missing output file argument");
                print_usage();
                process::exit(1);
            }

            let output_file = &args[4];
            let (offset, scale, length) = parse_decode_params(&args[5..]);
            let accessor = decode_or_exit(format, &buffer, offset, scale, length);

            if let Err(e) = accessor.write_csv(output_file) {
                eprintln!("Error writing CSV file '{}': {}", output_file, e);
                process::exit(1);
            }

            println!("Successfully converted {} to {}", input_file, output_file);
            println!("Total samples written: {}", accessor.len());
        }

        "extract" => {
            if args.len() < 5 {
                eprintln!("Error: Missing sample index argument");
                print_usage();
                process::exit(1);
            }

            let index: usize = match args[4].parse() {
                Ok(n) => n,
                Err(_) => {
                    eprintln!("Error: Invalid sample index '{}'", args[4]);
                    process::exit(1);
                }
            };

            let (offset, scale, length) = parse_decode_params(&args[5..]);
            let accessor = decode_or_exit(format, &buffer, offset, scale, length);

            if index >= accessor.len() {
                eprintln!("Error: Sample {} not found (capture has {} samples)",
                         index, accessor.len());
                process::exit(1);
            }

            println!("# Sample {} from {}", index, input_file);
            println!("Raw code: {}", accessor.raw_code(index));
            println!("Value: {}", accessor.value(index));

            // Stride logs may contain gaps; show the substituted value too.
            if format == WaveformFormat::VariableStrideLog {
                match GapFillingAccessor::wrap(accessor) {
                    Ok(filled) => println!("Value (gap-filled): {}", filled.value(index)),
                    Err(e) => {
                        eprintln!("Error wrapping accessor: {}", e);
                        process::exit(1);
                    }
                }
            }
        }

        _ => {
            eprintln!("Error: Unknown command '{}'", command);
            print_usage();
            process::exit(1);
        }
    }
}

fn decode_or_exit<'a>(
    format: WaveformFormat,
    buffer: &'a [u8],
    offset: f64,
    scale: f64,
    length: Option<usize>,
) -> SampleAccessor<'a> {
    let descriptor = CaptureDescriptor {
        format,
        values: RawBuffer::Bytes(buffer),
        offset,
        scale,
        length,
    };

    match SampleAccessor::decode(&descriptor) {
        Ok(accessor) => accessor,
        Err(e) => {
            eprintln!("Error decoding capture: {}", e);
            process::exit(1);
        }
    }
}

fn print_capture_info(input_file: &str, accessor: &SampleAccessor, buffer_bytes: usize) {
    println!("Capture Information");
    println!("===================");
    println!();
    println!("File: {}", input_file);
    println!("Format: {:?}", accessor.format());
    println!("Buffer size: {} bytes", buffer_bytes);
    println!("Sample count: {}", accessor.len());
    println!();

    if accessor.is_empty() {
        println!("Capture contains no samples");
        return;
    }

    let mut min_v = f64::INFINITY;
    let mut max_v = f64::NEG_INFINITY;
    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    let mut gaps = 0usize;

    for i in 0..accessor.len() {
        let v = accessor.value(i);
        if v.is_nan() {
            gaps += 1;
            continue;
        }
        min_v = min_v.min(v);
        max_v = max_v.max(v);
        sum += v;
        sum_sq += v * v;
    }

    let valid = accessor.len() - gaps;
    println!("Sample Statistics:");
    println!("  Valid samples: {}", valid);
    println!("  Gaps (NaN): {}", gaps);

    if valid > 0 {
        let avg = sum / valid as f64;
        let rms = (sum_sq / valid as f64).sqrt();
        println!("  Data range: {:.6} to {:.6}", min_v, max_v);
        println!("  Peak-to-peak: {:.6}", max_v - min_v);
        println!("  Average: {:.6}", avg);
        println!("  RMS: {:.6}", rms);
    }
}
