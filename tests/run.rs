use std::{fs, path::{Path, PathBuf}};

use areaweight::{run, AreaWeightError, RunConfig};
use shapefile::{dbase, dbase::TableWriterBuilder, Point, PolygonRing, Writer};

fn square(id_field: &str, id: &str, x0: f64, y0: f64, side: f64, pop: Option<f64>) -> String {
    let (x1, y1) = (x0 + side, y0 + side);
    let pop = pop.map(|p| format!(r#", "pop": {p}"#)).unwrap_or_default();
    format!(
        r#"{{"type": "Feature", "properties": {{"{id_field}": "{id}"{pop}}},
            "geometry": {{"type": "Polygon", "coordinates": [[[{x0}, {y0}], [{x1}, {y0}], [{x1}, {y1}], [{x0}, {y1}], [{x0}, {y0}]]]}}}}"#
    )
}

fn rect(id_field: &str, id: &str, x0: f64, y0: f64, x1: f64, y1: f64) -> String {
    format!(
        r#"{{"type": "Feature", "properties": {{"{id_field}": "{id}"}},
            "geometry": {{"type": "Polygon", "coordinates": [[[{x0}, {y0}], [{x1}, {y0}], [{x1}, {y1}], [{x0}, {y1}], [{x0}, {y0}]]]}}}}"#
    )
}

fn write_layer(dir: &Path, name: &str, features: &[String]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!(r#"{{"type": "FeatureCollection", "features": [{}]}}"#, features.join(","))).unwrap();
    path
}

/// Two abutting 10x10 blocks with 50 people each, a tract covering both and a tract far away.
fn fixture(dir: &Path) -> RunConfig {
    let from_layer = write_layer(dir, "blocks.geojson", &[
        square("block", "b1", 0.0, 0.0, 10.0, Some(50.0)),
        square("block", "b2", 10.0, 0.0, 10.0, Some(50.0)),
    ]);
    let to_layer = write_layer(dir, "tracts.geojson", &[
        rect("tract", "t1", 0.0, 0.0, 20.0, 10.0),
        rect("tract", "t2", 100.0, 100.0, 110.0, 110.0),
    ]);

    RunConfig {
        from_layer,
        to_layer,
        from_id: "block".to_string(),
        to_id: "tract".to_string(),
        attributes: vec!["pop".to_string()],
        buffer: None,
        transform_before_buffer: false,
        total_area: false,
        from_table: None,
        from_table_id: None,
        output: Some(dir.join("out.csv")),
        contrib: None,
        from_crs: None,
        to_crs: None,
    }
}

#[test]
fn writes_aggregates_and_contributions() {
    let dir = tempfile::tempdir().unwrap();
    let config = RunConfig { contrib: Some(dir.path().join("contrib.csv")), ..fixture(dir.path()) };

    let summary = run(&config).unwrap();
    assert_eq!(summary.targets, 2);
    assert_eq!(summary.contributions, 2);

    assert_eq!(
        fs::read_to_string(dir.path().join("out.csv")).unwrap(),
        "tract,aw_n,aw_a,pop\nt1,2,200,50\nt2,0,0,0\n"
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("contrib.csv")).unwrap(),
        "tract,block,total_area,from_area,prop,pop,aw_pop\n\
         t1,b1,200,100,0.5,50,25\n\
         t1,b2,200,100,0.5,50,25\n"
    );
}

#[test]
fn total_area_counts_whole_sources() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = fixture(dir.path());
    config.to_layer = write_layer(dir.path(), "half.geojson", &[rect("tract", "t1", 0.0, 0.0, 5.0, 10.0)]);
    config.total_area = true;

    run(&config).unwrap();
    assert_eq!(fs::read_to_string(dir.path().join("out.csv")).unwrap(), "tract,aw_n,aw_a,pop\nt1,1,100,50\n");
}

#[test]
fn attributes_can_come_from_a_table() {
    let dir = tempfile::tempdir().unwrap();
    let table = dir.path().join("blocks.csv");
    fs::write(&table, "geoid,pop\nb1,10\nb2,30\n").unwrap();

    let config = RunConfig {
        from_table: Some(table),
        from_table_id: Some("geoid".to_string()),
        ..fixture(dir.path())
    };
    run(&config).unwrap();
    assert_eq!(
        fs::read_to_string(dir.path().join("out.csv")).unwrap(),
        "tract,aw_n,aw_a,pop\nt1,2,200,20\nt2,0,0,0\n"
    );
}

#[test]
fn table_missing_a_requested_column_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let table = dir.path().join("blocks.csv");
    fs::write(&table, "block,jobs\nb1,10\n").unwrap();

    let config = RunConfig { from_table: Some(table), ..fixture(dir.path()) };
    let err = run(&config).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<AreaWeightError>(),
        Some(AreaWeightError::MissingAttribute { id: None, .. })
    ));
}

#[test]
fn existing_output_is_left_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let config = RunConfig { contrib: Some(dir.path().join("contrib.csv")), ..fixture(dir.path()) };
    fs::write(dir.path().join("out.csv"), "keep me").unwrap();

    let err = run(&config).unwrap_err();
    assert!(matches!(err.downcast_ref::<AreaWeightError>(), Some(AreaWeightError::Configuration { .. })));
    assert_eq!(fs::read_to_string(dir.path().join("out.csv")).unwrap(), "keep me");
    assert!(!dir.path().join("contrib.csv").exists());
}

#[test]
fn output_and_contrib_must_differ() {
    let dir = tempfile::tempdir().unwrap();
    let config = RunConfig { contrib: Some(dir.path().join("out.csv")), ..fixture(dir.path()) };

    let err = run(&config).unwrap_err();
    assert!(matches!(err.downcast_ref::<AreaWeightError>(), Some(AreaWeightError::DuplicateOutput { .. })));
    assert!(!dir.path().join("out.csv").exists());
}

#[test]
fn missing_attribute_on_layer_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let config = RunConfig { attributes: vec!["jobs".to_string()], ..fixture(dir.path()) };

    let err = run(&config).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<AreaWeightError>(),
        Some(AreaWeightError::MissingAttribute { id: Some(id), .. }) if id == "b1"
    ));
}

#[test]
fn unsupported_layer_format_is_a_data_source_error() {
    let dir = tempfile::tempdir().unwrap();
    let bogus = dir.path().join("blocks.txt");
    fs::write(&bogus, "").unwrap();

    let config = RunConfig { from_layer: bogus, ..fixture(dir.path()) };
    let err = run(&config).unwrap_err();
    assert!(matches!(err.downcast_ref::<AreaWeightError>(), Some(AreaWeightError::DataSource { .. })));
}

#[test]
fn repeated_runs_are_identical() {
    let dir = tempfile::tempdir().unwrap();
    let first = RunConfig { contrib: Some(dir.path().join("c1.csv")), ..fixture(dir.path()) };
    let second = RunConfig {
        output: Some(dir.path().join("out2.csv")),
        contrib: Some(dir.path().join("c2.csv")),
        ..fixture(dir.path())
    };

    run(&first).unwrap();
    run(&second).unwrap();

    let read = |name: &str| fs::read_to_string(dir.path().join(name)).unwrap();
    assert_eq!(read("out.csv"), read("out2.csv"));
    assert_eq!(read("c1.csv"), read("c2.csv"));
}

const UTM_15N: &str = r#"PROJCS["NAD83 / UTM zone 15N",GEOGCS["NAD83",DATUM["North_American_Datum_1983",SPHEROID["GRS 1980",6378137,298.257222101]],AUTHORITY["EPSG","4269"]],PROJECTION["Transverse_Mercator"],UNIT["metre",1],AUTHORITY["EPSG","26915"]]"#;

/// The fixture blocks as a Shapefile in UTM 15N.
fn write_block_shapefile(dir: &Path) -> PathBuf {
    let path = dir.join("blocks.shp");
    let table = TableWriterBuilder::new()
        .add_character_field("block".try_into().unwrap(), 10)
        .add_numeric_field("pop".try_into().unwrap(), 10, 0);
    {
        let mut writer = Writer::from_path(&path, table).unwrap();
        for (id, x0) in [("b1", 0.0), ("b2", 10.0)] {
            let square = shapefile::Polygon::new(PolygonRing::Outer(vec![
                Point::new(x0, 0.0),
                Point::new(x0, 10.0),
                Point::new(x0 + 10.0, 10.0),
                Point::new(x0 + 10.0, 0.0),
                Point::new(x0, 0.0),
            ]));
            let mut record = dbase::Record::default();
            record.insert("block".to_string(), dbase::FieldValue::Character(Some(id.to_string())));
            record.insert("pop".to_string(), dbase::FieldValue::Numeric(Some(50.0)));
            writer.write_shape_and_record(&square, &record).unwrap();
        }
    }
    fs::write(path.with_extension("prj"), UTM_15N).unwrap();
    path
}

#[test]
fn shapefile_sources_in_matching_projection() {
    let dir = tempfile::tempdir().unwrap();
    let to_layer = dir.path().join("tracts_utm.geojson");
    fs::write(&to_layer, format!(
        r#"{{"type": "FeatureCollection",
            "crs": {{"type": "name", "properties": {{"name": "urn:ogc:def:crs:EPSG::26915"}}}},
            "features": [{}]}}"#,
        rect("tract", "t1", 0.0, 0.0, 20.0, 10.0),
    )).unwrap();

    let config = RunConfig {
        from_layer: write_block_shapefile(dir.path()),
        to_layer,
        contrib: Some(dir.path().join("contrib.csv")),
        ..fixture(dir.path())
    };
    let summary = run(&config).unwrap();
    assert_eq!(summary.contributions, 2);

    assert_eq!(fs::read_to_string(dir.path().join("out.csv")).unwrap(), "tract,aw_n,aw_a,pop\nt1,2,200,50\n");
    let contrib = fs::read_to_string(dir.path().join("contrib.csv")).unwrap();
    let rows = contrib.lines().skip(1).map(|line| line.split(',').take(4).collect::<Vec<_>>().join(",")).collect::<Vec<_>>();
    assert_eq!(rows, ["t1,b1,200,100", "t1,b2,200,100"]);
}
