// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `lesewerk crop`: cut a rectangle out of an image and save it.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use lesewerk_document::ImageProcessor;
use tracing::info;

#[derive(Debug, Args)]
pub struct CropArgs {
    /// Image to crop
    pub image: PathBuf,

    /// Two opposite corners in pixels; either corner may come first
    #[arg(long = "box", value_name = "X1,Y1,X2,Y2", value_parser = parse_box)]
    pub crop_box: CropBox,

    /// Where to write the result; the extension picks the format
    #[arg(short, long)]
    pub output: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropBox {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

fn parse_box(value: &str) -> Result<CropBox, String> {
    let coords = value
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<u32>()
                .map_err(|_| format!("'{}' is not a pixel coordinate", part.trim()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    match coords.as_slice() {
        &[x1, y1, x2, y2] => Ok(CropBox { x1, y1, x2, y2 }),
        _ => Err(format!("expected four coordinates, got {}", coords.len())),
    }
}

pub fn run(args: &CropArgs) -> Result<()> {
    let CropBox { x1, y1, x2, y2 } = args.crop_box;
    let cropped = ImageProcessor::open(&args.image)?.crop_box(x1, y1, x2, y2)?;
    cropped
        .save(&args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    info!(
        output = %args.output.display(),
        width = cropped.width(),
        height = cropped.height(),
        "Cropped image saved"
    );
    Ok(())
}
