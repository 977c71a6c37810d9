use approx::assert_relative_eq;
use roichart_core::{augment_with_centiles, CentileKind, DatasetProvider};
use roichart_io::{CentileDirectory, CsvProvider, DatasetReader};
use std::fs;

const DATA: &str = "MRID,Age,Sex,GM\n\
                    S1,60,F,500\n\
                    S2,65,M,520\n";

const CENTILES: &str = "ROI,Age,centile_5,centile_25,centile_50,centile_75,centile_95\n\
                        GM,60,400,450,500,550,600\n";

#[test]
fn test_provider_loads_dataset_and_centiles() {
    let dir = tempfile::tempdir().unwrap();
    let data_path = dir.path().join("volumes.csv");
    fs::write(&data_path, DATA).unwrap();
    fs::write(dir.path().join("istag_centiles_CN.csv"), CENTILES).unwrap();

    let provider = CsvProvider::new(&data_path).with_centile_dir(dir.path());
    let dataset = provider.load_dataset().unwrap();
    assert_eq!(dataset.len(), 2);

    let table = provider.load_centiles(CentileKind::Cn).unwrap().unwrap();
    assert_eq!(table.levels().len(), 5);
    assert!(provider.load_centiles(CentileKind::CnMales).unwrap().is_none());
    assert!(provider.load_centiles(CentileKind::None).unwrap().is_none());

    let scored = augment_with_centiles(&dataset, &table, "Age").unwrap();
    assert_relative_eq!(scored.dataset.numeric("GM_centiles").unwrap()[0], 50.0);
}

#[test]
fn test_provider_without_centile_dir() {
    let dir = tempfile::tempdir().unwrap();
    let data_path = dir.path().join("volumes.csv");
    fs::write(&data_path, DATA.replace("MRID", "SubjectID")).unwrap();

    let provider = CsvProvider::new(&data_path)
        .with_reader(DatasetReader::new().with_id_column("SubjectID"));
    assert_eq!(provider.load_dataset().unwrap().id_column(), "SubjectID");
    assert!(provider.load_centiles(CentileKind::Cn).unwrap().is_none());
}

#[test]
fn test_directory_load_all() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("istag_centiles_CN.csv"), CENTILES).unwrap();
    fs::write(dir.path().join("istag_centiles_CN_Females.csv"), CENTILES).unwrap();

    let loaded = CentileDirectory::new(dir.path()).load_all().unwrap();
    let kinds: Vec<CentileKind> = loaded.iter().map(|(kind, _)| *kind).collect();
    assert_eq!(kinds, vec![CentileKind::Cn, CentileKind::CnFemales]);
}
