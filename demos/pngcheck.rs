use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use clap::Parser;

use png_chunks::{ChunkKind, CrcMode, DecodeOptions, Decoder};

#[derive(Parser)]
#[command(about, version)]
struct Config {
    /// test quietly (output only errors)
    #[arg(short, long)]
    quiet: bool,
    /// test verbosely (print every chunk)
    #[arg(short, long)]
    verbose: bool,
    /// keep going over CRC mismatches instead of stopping
    #[arg(short, long)]
    lenient: bool,
    paths: Vec<PathBuf>,
}

fn display_interlaced(i: bool) -> &'static str {
    if i {
        "interlaced"
    } else {
        "non-interlaced"
    }
}

fn display_image_type(bits: u8, color: png_chunks::ColorType) -> String {
    use png_chunks::ColorType::*;
    format!(
        "{}-bit {}",
        bits,
        match color {
            Grayscale => "grayscale",
            Rgb => "RGB",
            Indexed => "palette",
            GrayscaleAlpha => "grayscale+alpha",
            Rgba => "RGB+alpha",
        }
    )
}

fn check_image<P: AsRef<Path>>(c: &Config, fname: P) -> io::Result<()> {
    let file = File::open(&fname)?;
    let fname = fname.as_ref().to_string_lossy();

    let mut options = DecodeOptions::new();
    if c.lenient {
        options.set_crc_mode(CrcMode::Lenient);
    }

    let display_error = |err| {
        if c.verbose {
            println!(": {}", err);
            print!("ERRORS DETECTED");
            println!(" in {}", fname);
        } else {
            if !c.quiet {
                println!("ERROR: {}", fname)
            }
            print!("{}: ", fname);
            println!("{}", err);
        }
    };

    if c.verbose {
        print!("File: {}", fname);
    }

    let mut reader = match Decoder::new_with_options(file, options).read_signature() {
        Ok(reader) => reader,
        Err(err) => {
            display_error(err);
            return Ok(());
        }
    };

    loop {
        match reader.next_chunk() {
            Ok(Some(chunk)) => {
                if c.verbose {
                    println!();
                    print!(
                        "  chunk {} at offset {:#07x}, length {}",
                        chunk.type_,
                        chunk.offset,
                        chunk.len()
                    );
                    if !chunk.is_valid() {
                        print!(" (BAD CRC)");
                    }
                }
                match chunk.kind() {
                    ChunkKind::Header => {
                        if let Some(info) = reader.info() {
                            if c.verbose {
                                println!();
                                print!(
                                    "    {} x {} image, {}, {}",
                                    info.width,
                                    info.height,
                                    display_image_type(info.bit_depth as u8, info.color_type),
                                    display_interlaced(info.interlaced),
                                );
                            }
                        }
                    }
                    ChunkKind::AnimationControl => {
                        if let Some(actl) = reader.info().and_then(|i| i.animation_control()) {
                            if c.verbose {
                                println!();
                                print!("    {} frames, {} plays", actl.num_frames, actl.num_plays);
                            }
                        }
                    }
                    ChunkKind::FrameControl => {
                        if let Some(fctl) = reader.info().and_then(|i| i.frame_control()) {
                            if c.verbose {
                                println!();
                                println!(
                                    "    sequence #{}, {} x {} pixels @ ({}, {})",
                                    fctl.sequence_number,
                                    fctl.width,
                                    fctl.height,
                                    fctl.x_offset,
                                    fctl.y_offset,
                                );
                                print!(
                                    "    {}/{} s delay, dispose: {}, blend: {}",
                                    fctl.delay_num,
                                    if fctl.delay_den == 0 {
                                        100
                                    } else {
                                        fctl.delay_den
                                    },
                                    fctl.dispose_op,
                                    fctl.blend_op,
                                );
                            }
                        }
                    }
                    ChunkKind::FrameData => {
                        if c.verbose {
                            if let Some(seq) = chunk.fdat_sequence_number() {
                                println!();
                                print!("    sequence #{}", seq);
                            }
                        }
                    }
                    _ => (),
                }
            }
            Ok(None) => break,
            Err(err) => {
                display_error(err);
                return Ok(());
            }
        }
    }

    for diagnostic in reader.diagnostics() {
        if !c.quiet {
            println!();
            print!("  warning: {}", diagnostic);
        }
    }

    if !c.verbose && !c.quiet {
        let animated = reader.info().map_or(false, |info| info.is_animated());
        println!(
            "OK: {} ({} chunks{})",
            fname,
            reader.chunks_read(),
            if animated { ", animated" } else { "" }
        );
    } else if !c.quiet {
        println!();
        print!("No errors detected ");
        println!(
            "in {} ({} chunks, {} bytes)",
            fname,
            reader.chunks_read(),
            reader.bytes_consumed(),
        );
    }

    Ok(())
}

fn main() {
    let config = Config::parse();

    for file in &config.paths {
        let result = if let Some(glob) = file.to_str().filter(|n| n.contains('*')) {
            glob::glob(glob)
                .map_err(|err| io::Error::new(io::ErrorKind::Other, err))
                .and_then(|mut glob| {
                    glob.try_for_each(|entry| {
                        entry
                            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))
                            .and_then(|file| check_image(&config, file))
                    })
                })
        } else {
            check_image(&config, file)
        };

        result.unwrap_or_else(|err| {
            println!("{}: {}", file.display(), err);
            std::process::exit(1)
        });
    }
}
