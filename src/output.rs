use std::{
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::Context;
use compress_io::compress::CompressIo;
use serde::Serialize;

use crate::{
    cli::Config,
    columns::write_columns,
    design::{write_matrix, DesignBuilder},
    genome::Genome,
    locations::{Locations, SelectionIntervals},
    tracks::{self, Transform},
};

#[derive(Serialize)]
struct JsOutput<'a> {
    program: &'static str,
    version: &'static str,
    date: String,
    kmer_length: usize,
    mappability: bool,
    rev_compl: bool,
    inputs: &'a [PathBuf],
    n_chromosomes: usize,
    total_length: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    design_kmers: Option<usize>,
}

impl<'a> JsOutput<'a> {
    fn make(cfg: &'a Config, genome: &Genome, design_kmers: Option<usize>) -> Self {
        Self {
            program: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            date: cfg.date().to_rfc2822(),
            kmer_length: cfg.kmer_length(),
            mappability: cfg.transform() == Transform::Mappability,
            rev_compl: cfg.rev_compl(),
            inputs: cfg.inputs(),
            n_chromosomes: genome.chromosomes().len(),
            total_length: genome.chromosomes().total(),
            design_kmers,
        }
    }
}

fn output_txt<P: AsRef<Path>>(
    name: P,
    cfg: &Config,
    genome: &Genome,
    counts: &[u16],
) -> anyhow::Result<()> {
    debug!("Writing text dump");
    let mut wrt = CompressIo::new()
        .path(name)
        .bufwriter()
        .with_context(|| "Could not open text output file")?;

    tracks::write_txt(&mut wrt, counts, genome.chromosomes(), cfg.transform())?;
    wrt.flush().with_context(|| "Error flushing text output")
}

fn output_wig<P: AsRef<Path>>(
    name: P,
    sizes_name: P,
    cfg: &Config,
    genome: &Genome,
    counts: &[u16],
) -> anyhow::Result<()> {
    debug!("Writing wig track");
    let mut wrt = CompressIo::new()
        .path(name)
        .bufwriter()
        .with_context(|| "Could not open wig output file")?;

    tracks::write_wig(&mut wrt, counts, genome.chromosomes(), cfg.transform())?;
    wrt.flush().with_context(|| "Error flushing wig output")?;

    // written even when the track itself came out empty
    debug!("Writing chromosome sizes");
    let mut wrt = CompressIo::new()
        .path(sizes_name)
        .bufwriter()
        .with_context(|| "Could not open chrom.sizes output file")?;

    tracks::write_chrom_sizes(&mut wrt, genome.chromosomes())?;
    wrt.flush().with_context(|| "Error flushing chrom.sizes output")
}

fn output_bed<P: AsRef<Path>>(
    name: P,
    cfg: &Config,
    genome: &Genome,
    counts: &[u16],
    bedgraph: bool,
) -> anyhow::Result<()> {
    debug!("Writing {} track", if bedgraph { "bedgraph" } else { "bed" });
    let mut wrt = CompressIo::new()
        .path(name)
        .bufwriter()
        .with_context(|| "Could not open bed output file")?;

    tracks::write_bed(&mut wrt, counts, genome.chromosomes(), cfg.transform(), bedgraph)?;
    wrt.flush().with_context(|| "Error flushing bed output")
}

fn output_csv<P: AsRef<Path>>(
    name: P,
    cfg: &Config,
    genome: &Genome,
    locations: &Locations,
    selection: Option<&SelectionIntervals>,
) -> anyhow::Result<()> {
    debug!("Writing location csv");
    let mut wrt = CompressIo::new()
        .path(name)
        .bufwriter()
        .with_context(|| "Could not open csv output file")?;

    write_columns(
        &mut wrt,
        locations,
        genome.groups(),
        cfg.rev_compl(),
        selection,
        cfg.coord_style(),
    )?;
    wrt.flush().with_context(|| "Error flushing csv output")
}

/// Select and look up representative k-mers for each input genome in
/// turn, growing the shared dictionary and matrix.
fn build_design(
    cfg: &Config,
    genome: &Genome,
    counts: &[u16],
    locations: &Locations,
) -> anyhow::Result<DesignBuilder> {
    let params = cfg.design_params();
    let chroms = genome.chromosomes();
    let groups = genome.groups();

    let mut builder = DesignBuilder::new(groups.len());
    for g in 0..groups.len() {
        let first = groups.first_chrom(g) as usize;
        let last = groups.last_chrom(g) as usize;
        let span =
            chroms.span(first, counts.len()).start..chroms.span(last, counts.len()).end;
        builder.process_genome(g, span, counts, genome, locations, &params)?;
    }
    info!("Design matrix holds {} canonical k-mers", builder.n_kmers());
    Ok(builder)
}

fn output_matrix<P: AsRef<Path>>(
    name: P,
    genome: &Genome,
    builder: &DesignBuilder,
) -> anyhow::Result<()> {
    debug!("Writing design matrix");
    let mut wrt = CompressIo::new()
        .path(name)
        .bufwriter()
        .with_context(|| "Could not open design matrix output file")?;

    write_matrix(&mut wrt, builder, genome.groups())?;
    wrt.flush().with_context(|| "Error flushing design matrix output")
}

fn output_json<P: AsRef<Path>>(
    name: P,
    cfg: &Config,
    genome: &Genome,
    design_kmers: Option<usize>,
) -> anyhow::Result<()> {
    debug!("Writing JSON run summary");
    let wrt = CompressIo::new()
        .path(name)
        .bufwriter()
        .with_context(|| "Could not open output JSON file")?;

    let out = JsOutput::make(cfg, genome, design_kmers);

    serde_json::to_writer_pretty(wrt, &out)
        .with_context(|| "Error writing out JSON file with run summary")
}

pub fn output(
    cfg: &Config,
    genome: &Genome,
    counts: &[u16],
    locations: Option<&Locations>,
    selection: Option<&SelectionIntervals>,
) -> anyhow::Result<()> {
    let mut design_kmers = None;

    if cfg.txt() {
        output_txt(format!("{}.txt", cfg.prefix()), cfg, genome, counts)?;
    }
    if cfg.wig() {
        output_wig(
            format!("{}.wig", cfg.prefix()),
            format!("{}.chrom.sizes", cfg.prefix()),
            cfg,
            genome,
            counts,
        )?;
    }
    if cfg.bed() {
        output_bed(format!("{}.bed", cfg.prefix()), cfg, genome, counts, false)?;
    }
    if cfg.bedgraph() {
        output_bed(format!("{}.bedgraph", cfg.prefix()), cfg, genome, counts, true)?;
    }
    if cfg.csv() {
        let loc = locations.expect("Location index required for csv output");
        output_csv(format!("{}.csv", cfg.prefix()), cfg, genome, loc, selection)?;
    }
    if cfg.design() {
        let loc = locations.expect("Location index required for design output");
        let builder = build_design(cfg, genome, counts, loc)?;
        design_kmers = Some(builder.n_kmers());
        output_matrix(format!("{}.design.tsv", cfg.prefix()), genome, &builder)?;
    }

    output_json(format!("{}.json", cfg.prefix()), cfg, genome, design_kmers)
}
