//! Integration tests for MarketIQ

use std::io::Write;

use chrono::NaiveDate;
use marketiq::app::pipeline::{run_cluster, run_forecast};
use marketiq::data::{SampleConfig, generate_sample, write_sample_csv};
use marketiq::domain::{
    ClusterRequest, Dimension, ForecastRequest, ModelChoice, ModelKind, SelectionMode, SeriesSelection, Statistic,
};
use marketiq::error::AppError;
use marketiq::io::{DataStore, write_cluster_csv, write_forecast_csv, write_forecast_json};
use tempfile::NamedTempFile;

const HEADER: &str = "Fecha,Dia_del_anio,ID_Cliente,ID_Producto,Categoria,Descripcion_Producto,Nombre_Producto,Tienda,Ventas_Unidades,Precio_Compra,Precio_Venta";

fn csv_file() -> NamedTempFile {
    tempfile::Builder::new().suffix(".csv").tempfile().unwrap()
}

/// Category A sells 10 units every day, category B 4 units.
fn create_flat_sales_csv(days: usize) -> NamedTempFile {
    let mut file = csv_file();
    writeln!(file, "{HEADER}").unwrap();
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    for day in 0..days {
        let date = start + chrono::Duration::days(day as i64);
        writeln!(file, "{date},{},C1,P1,A,agua,Agua,Centro,10,1.0,1.5", day + 1).unwrap();
        writeln!(file, "{date},{},C2,P2,B,pan,Pan,Norte,4,0.5,0.9", day + 1).unwrap();
    }
    file
}

#[test]
fn test_flat_category_forecast() {
    let file = create_flat_sales_csv(60);
    let request = ForecastRequest {
        file: file.path().to_path_buf(),
        selection: SeriesSelection::new(SelectionMode::Category, "A", None).unwrap(),
        model: ModelChoice::All,
    };

    let run = run_forecast(&request).unwrap();
    let out = &run.output;
    assert_eq!(out.series.len(), 60);
    assert_eq!(out.evaluation.train.len(), 45);
    assert_eq!(out.evaluation.test.len(), 15);
    assert_eq!(out.evaluation.results.len(), 3);

    let ma = out.evaluation.get(ModelKind::MovingAverage).unwrap();
    assert!(ma.is_ok());
    assert!(ma.predictions.values().iter().all(|v| (*v - 10.0).abs() < 1e-12));
    assert_eq!(ma.mape, 0.0);
    assert_eq!(ma.rmse, 0.0);

    let ma_ext = out
        .extension
        .iter()
        .find(|e| e.kind == ModelKind::MovingAverage)
        .unwrap();
    assert_eq!(ma_ext.forecast.len(), 30);
    // 2024 is a leap year: day 61 is March 1st.
    assert_eq!(ma_ext.forecast.start(), NaiveDate::from_ymd_opt(2024, 3, 1));
    assert!(ma_ext.forecast.values().iter().all(|v| (*v - 10.0).abs() < 1e-12));
}

#[test]
fn test_identical_stores_have_no_variance() {
    let mut file = csv_file();
    writeln!(file, "{HEADER}").unwrap();
    for store in ["Centro", "Norte", "Sur"] {
        writeln!(file, "2024-01-01,1,C1,P1,A,agua,Agua,{store},5,1.0,2.0").unwrap();
        writeln!(file, "2024-01-02,2,C2,P2,A,pan,Pan,{store},3,0.5,1.0").unwrap();
    }

    let request = ClusterRequest {
        file: file.path().to_path_buf(),
        dimension: Dimension::Store,
        stats: Dimension::Store.catalog().to_vec(),
        k: 2,
    };
    let err = run_cluster(&request).unwrap_err();
    assert!(matches!(err, AppError::NoVariance));
    assert_eq!(err.exit_code(), 3);
}

#[test]
fn test_upload_lists_missing_columns() {
    let dir = tempfile::tempdir().unwrap();
    let store = DataStore::new(dir.path().join("data"));

    let mut file = csv_file();
    writeln!(file, "Fecha,Categoria,Tienda").unwrap();
    writeln!(file, "2024-01-01,A,Centro").unwrap();

    let err = store.upload(file.path()).unwrap_err();
    let AppError::Schema { missing, .. } = &err else {
        panic!("expected a schema error, got {err:?}");
    };
    assert!(missing.contains(&"Nombre_Producto".to_string()));
    assert!(missing.contains(&"Ventas_Unidades".to_string()));
    assert!(!missing.contains(&"Fecha".to_string()));
    assert_eq!(err.exit_code(), 2);
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn test_batch_delete_reports_each_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = DataStore::new(dir.path());
    std::fs::write(dir.path().join("a.csv"), "x").unwrap();
    std::fs::write(dir.path().join("b.xlsx"), "x").unwrap();

    let names = vec!["a.csv".to_string(), "missing.csv".to_string(), "b.xlsx".to_string()];
    let outcomes = store.delete(&names);

    assert_eq!(outcomes.len(), 3);
    assert!(outcomes[0].result.is_ok());
    assert!(outcomes[1].result.is_err());
    assert!(outcomes[2].result.is_ok());
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn test_sample_sheet_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let store = DataStore::new(dir.path().join("data"));
    let sheet = dir.path().join("ventas.csv");

    let records = generate_sample(&SampleConfig::default()).unwrap();
    write_sample_csv(&sheet, &records).unwrap();
    let table = store.upload(&sheet).unwrap();
    assert_eq!(table.rows_used, records.len());
    assert_eq!(store.list().unwrap(), vec!["ventas.csv".to_string()]);

    // Forecast one product.
    let forecast = run_forecast(&ForecastRequest {
        file: store.resolve("ventas.csv").unwrap(),
        selection: SeriesSelection::new(SelectionMode::Product, "Bebidas", Some("Agua".to_string())).unwrap(),
        model: ModelChoice::MovingAverage,
    })
    .unwrap();
    assert_eq!(forecast.output.series.len(), 120);
    assert_eq!(forecast.output.extension.len(), 1);

    let csv_path = dir.path().join("forecast.csv");
    write_forecast_csv(&csv_path, &forecast.output.evaluation, &forecast.output.extension).unwrap();
    let csv = std::fs::read_to_string(&csv_path).unwrap();
    assert_eq!(csv.lines().next(), Some("date,actual,holt_winters,sarima,moving_average"));
    assert_eq!(csv.lines().count(), 1 + 15 + 30);

    let json_path = dir.path().join("forecast.json");
    let out = &forecast.output;
    write_forecast_json(&json_path, &out.selection, &out.series, &out.evaluation, &out.extension).unwrap();
    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(json["selection"]["product"], "Agua");

    // Segment customers.
    let clusters = run_cluster(&ClusterRequest {
        file: store.resolve("ventas.csv").unwrap(),
        dimension: Dimension::Customer,
        stats: vec![Statistic::AvgPurchase, Statistic::PurchaseFrequency],
        k: 4,
    })
    .unwrap();
    let table = &clusters.clusters;
    assert!(table.rows.len() >= 4);
    assert!(table.rows.iter().all(|r| r.cluster < 4));
    assert_eq!(table.profiles().iter().map(|p| p.size).sum::<usize>(), table.rows.len());

    let cluster_path = dir.path().join("clusters.csv");
    write_cluster_csv(&cluster_path, table).unwrap();
    let cluster_csv = std::fs::read_to_string(&cluster_path).unwrap();
    assert_eq!(
        cluster_csv.lines().next(),
        Some("ID_Cliente,Promedio_Compra,Frecuencia_Compra,Cluster")
    );

    // Same inputs, same labels.
    let again = run_cluster(&ClusterRequest {
        file: store.resolve("ventas.csv").unwrap(),
        dimension: Dimension::Customer,
        stats: vec![Statistic::AvgPurchase, Statistic::PurchaseFrequency],
        k: 4,
    })
    .unwrap();
    assert_eq!(again.clusters.rows, clusters.clusters.rows);
}
