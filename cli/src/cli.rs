use std::path::PathBuf;

/// Area-weighted transfer of attributes from one polygon layer onto another
#[derive(clap::Parser, Debug)]
#[command(name = "areaweight", version, about)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Layer with the attributes to weight (.shp, .geojson)
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub from_layer: PathBuf,

    /// Layer to weight the attributes onto (.shp, .geojson)
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub to_layer: PathBuf,

    /// Id field of the from-layer
    #[arg(long)]
    pub from_id: String,

    /// Id field of the to-layer
    #[arg(long)]
    pub to_id: String,

    /// Attributes to weight
    #[arg(long, num_args = 1.., required = true)]
    pub attributes: Vec<String>,

    /// Buffer to-layer polygons by this distance before intersecting
    #[arg(long, allow_negative_numbers = true)]
    pub buffer: Option<f64>,

    /// Re-project to-layer polygons before buffering instead of after
    #[arg(long)]
    pub transform_before_buffer: bool,

    /// Weight by the full area of each from-layer polygon, not the overlap
    #[arg(long)]
    pub total_area: bool,

    /// CSV table to read attributes from instead of the from-layer
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub from_table: Option<PathBuf>,

    /// Id column of the from-table, defaults to --from-id
    #[arg(long, requires = "from_table")]
    pub from_table_id: Option<String>,

    /// Output CSV, defaults to stdout (refuses to overwrite)
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Per-contribution CSV (refuses to overwrite)
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub contrib: Option<PathBuf>,

    /// Spatial reference of the from-layer, e.g. EPSG:26915 or a +proj string
    #[arg(long)]
    pub from_crs: Option<String>,

    /// Spatial reference of the to-layer
    #[arg(long)]
    pub to_crs: Option<String>,
}
