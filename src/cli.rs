use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::{columns::CoordStyle, design::DesignParams, tracks::Transform};

mod cli_model;

pub struct Config {
    inputs: Vec<PathBuf>,
    counts: PathBuf,
    locations: Option<PathBuf>,
    selection: Option<PathBuf>,
    prefix: String,
    kmer_length: usize,
    transform: Transform,
    rev_compl: bool,
    txt: bool,
    wig: bool,
    bed: bool,
    bedgraph: bool,
    csv: bool,
    design: bool,
    sample_rate: usize,
    reps_per_window: usize,
    exclusion_radius: u64,
    coord_style: CoordStyle,
    date: DateTime<Local>,
}

impl Config {
    pub fn inputs(&self) -> &[PathBuf] {
        &self.inputs
    }

    pub fn counts(&self) -> &Path {
        &self.counts
    }

    pub fn locations(&self) -> Option<&Path> {
        self.locations.as_deref()
    }

    pub fn selection(&self) -> Option<&Path> {
        self.selection.as_deref()
    }

    pub fn prefix(&self) -> &str {
        self.prefix.as_str()
    }

    pub fn kmer_length(&self) -> usize {
        self.kmer_length
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn rev_compl(&self) -> bool {
        self.rev_compl
    }

    pub fn txt(&self) -> bool {
        self.txt
    }

    pub fn wig(&self) -> bool {
        self.wig
    }

    pub fn bed(&self) -> bool {
        self.bed
    }

    pub fn bedgraph(&self) -> bool {
        self.bedgraph
    }

    pub fn csv(&self) -> bool {
        self.csv
    }

    pub fn design(&self) -> bool {
        self.design
    }

    pub fn coord_style(&self) -> CoordStyle {
        self.coord_style
    }

    pub fn date(&self) -> &DateTime<Local> {
        &self.date
    }

    pub fn design_params(&self) -> DesignParams {
        DesignParams {
            kmer_length: self.kmer_length,
            sample_rate: self.sample_rate,
            reps_per_window: self.reps_per_window,
            exclusion_radius: self.exclusion_radius,
            rev_compl: self.rev_compl,
        }
    }
}

pub fn handle_cli() -> anyhow::Result<Config> {
    let c = cli_model::cli_model();
    let m = c.get_matches();
    super::utils::init_log(&m);

    let inputs: Vec<PathBuf> = m
        .get_many::<PathBuf>("input")
        .expect("Missing required argument")
        .cloned()
        .collect();

    let counts = m
        .get_one::<PathBuf>("counts")
        .map(|p| p.to_owned())
        .expect("Missing required argument");

    let locations = m.get_one::<PathBuf>("locations").map(|p| p.to_owned());
    let selection = m.get_one::<PathBuf>("selection").map(|p| p.to_owned());

    let prefix = m
        .get_one::<String>("prefix")
        .map(|s| s.to_owned())
        .expect("Missing default argument");

    let kmer_length = m
        .get_one::<u64>("kmer_length")
        .copied()
        .expect("Missing required argument") as usize;

    let sample_rate = m
        .get_one::<u64>("sample_rate")
        .copied()
        .expect("Missing default argument") as usize;

    if kmer_length / sample_rate == 0 {
        return Err(anyhow!(
            "Illegal sample rate: windows of kmer_length / sample_rate bases would be empty"
        ));
    }

    let reps_per_window = m
        .get_one::<u64>("reps_per_window")
        .copied()
        .expect("Missing default argument") as usize;

    let exclusion_radius = m
        .get_one::<u64>("exclusion_radius")
        .copied()
        .expect("Missing default argument");

    let transform = if m.get_flag("mappability") {
        Transform::Mappability
    } else {
        Transform::Frequency
    };

    let coord_style = if m.get_flag("absolute_coords") {
        CoordStyle::Absolute
    } else {
        CoordStyle::FileRelative
    };

    let (txt, wig) = (m.get_flag("txt"), m.get_flag("wig"));
    let (bed, bedgraph) = (m.get_flag("bed"), m.get_flag("bedgraph"));
    let (csv, design) = (m.get_flag("csv"), m.get_flag("design"));

    if !(txt || wig || bed || bedgraph || csv || design) {
        return Err(anyhow!(
            "No output selected: use at least one of --txt, --wig, --bed, --bedgraph, --csv, --design"
        ));
    }
    if (csv || design) && locations.is_none() {
        return Err(anyhow!("--csv and --design require a location index (--locations)"));
    }
    if selection.is_some() && !csv {
        return Err(anyhow!("--selection is only used by --csv output"));
    }

    Ok(Config {
        inputs,
        counts,
        locations,
        selection,
        prefix,
        kmer_length,
        transform,
        rev_compl: m.get_flag("rev_compl"),
        txt,
        wig,
        bed,
        bedgraph,
        csv,
        design,
        sample_rate,
        reps_per_window,
        exclusion_radius,
        coord_style,
        date: Local::now(),
    })
}
