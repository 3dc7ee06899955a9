#[macro_use]
extern crate log;
#[macro_use]
extern crate anyhow;

mod cli;
mod columns;
mod design;
mod genome;
mod locations;
mod output;
mod reader;
mod tracks;
mod utils;

use crate::design::LookupMiss;

// Exit status for a representative k-mer missing from the location
// index (corrupted upstream data)
const LOOKUP_MISS_EXIT: i32 = 23;

fn run() -> anyhow::Result<()> {
    let cfg = cli::handle_cli()?;
    let genome = reader::read_fastas(cfg.inputs())?;
    let counts = reader::read_counts(cfg.counts())?;

    let total = genome.chromosomes().total();
    let n = counts.len() as u64;
    if n > total || total - n >= cfg.kmer_length() as u64 {
        return Err(anyhow!(
            "Annotation array of {} values does not match chromosome table: expecting between {} and {}",
            n,
            total.saturating_sub(cfg.kmer_length() as u64 - 1),
            total
        ));
    }

    let locations = cfg.locations().map(reader::read_locations).transpose()?;
    let selection = cfg.selection().map(reader::read_selection).transpose()?;

    output::output(
        &cfg,
        &genome,
        &counts,
        locations.as_ref(),
        selection.as_ref(),
    )
}

fn main() {
    if let Err(e) = run() {
        error!("{:?}", e);
        let code = if e.is::<LookupMiss>() {
            LOOKUP_MISS_EXIT
        } else {
            1
        };
        std::process::exit(code)
    }
}
