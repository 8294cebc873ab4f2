use polars::prelude::*;
use rayon::prelude::*;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, instrument};
use tracing_error::SpanTrace;

use crate::columns::ColumnDescriptor;
use crate::domain::TVError;
use crate::record::{Dataset, Record, Value};

#[derive(Debug, PartialEq)]
enum FileType {
    CSV,
    PARQUET,
    ARROW,
}

#[derive(Debug)]
struct FileInfo {
    path: PathBuf,
    file_size: u64,
    file_type: FileType,
}

/// Expands `~` and environment variables in a user supplied path.
pub fn expand_path(raw: &str) -> Result<PathBuf, TVError> {
    shellexpand::full(raw)
        .map(|p| PathBuf::from(p.as_ref()))
        .map_err(|e| TVError::InvalidPath(e.to_string()))
}

/// Reads a csv, parquet or arrow file into memory.
///
/// Columns are converted in parallel. Integer and float columns keep their
/// numeric values so they sort numerically, everything else becomes text.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_data_file(path: PathBuf) -> Result<Dataset, TVError> {
    let file_info = get_file_info(path)?;
    debug!("Loading {:?}", file_info);
    let frame = match file_info.file_type {
        FileType::CSV => load_csv(&file_info.path)?,
        FileType::PARQUET => load_parquet(&file_info.path)?,
        FileType::ARROW => load_arrow(&file_info.path)?,
    };

    let start_time = Instant::now();
    let df = frame.collect()?;
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();

    let columns = names
        .par_iter()
        .map(|name| load_column(&df, name))
        .collect::<Result<Vec<Vec<Value>>, PolarsError>>()?;

    let records: Vec<Record> = (0..df.height())
        .into_par_iter()
        .map(|row| {
            names
                .iter()
                .zip(columns.iter())
                .map(|(name, data)| (name.as_str(), data[row].clone()))
                .collect()
        })
        .collect();

    info!(
        "Loaded {} rows x {} columns ({} bytes) in {}ms",
        records.len(),
        names.len(),
        file_info.file_size,
        start_time.elapsed().as_millis()
    );

    let name = file_info
        .path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("???")
        .to_string();

    Ok(Dataset {
        name,
        columns: names
            .iter()
            .map(|n| ColumnDescriptor::new(n.as_str(), n.as_str()))
            .collect(),
        records,
    })
}

fn detect_file_type(path: &Path) -> Result<FileType, TVError> {
    match path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_uppercase())
        .as_deref()
    {
        Some("CSV") => Ok(FileType::CSV),
        Some("PARQUET") | Some("PQ") => Ok(FileType::PARQUET),
        Some("ARROW") | Some("IPC") | Some("FEATHER") => Ok(FileType::ARROW),
        _ => Err(TVError::UnknownFileType),
    }
}

fn get_file_info(path: PathBuf) -> Result<FileInfo, TVError> {
    let metadata = fs::metadata(&path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => TVError::FileNotFound,
        ErrorKind::PermissionDenied => TVError::PermissionDenied,
        _ => TVError::IoError(e),
    })?;
    if !metadata.is_file() {
        return Err(TVError::LoadingFailed(
            "Not a file!".into(),
            SpanTrace::capture(),
        ));
    }

    let file_size = metadata.len();
    let file_type = detect_file_type(&path)?;

    Ok(FileInfo {
        path,
        file_size,
        file_type,
    })
}

fn is_integer_type(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

fn is_float_type(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Float32 | DataType::Float64)
}

fn load_column(df: &DataFrame, col_name: &str) -> Result<Vec<Value>, PolarsError> {
    let column = df.column(col_name)?;
    let dtype = column.dtype().clone();

    if is_integer_type(&dtype) {
        let col = column.cast(&DataType::Int64)?;
        let data: Vec<Value> = col
            .i64()?
            .into_iter()
            .map(|v| v.map_or(Value::Null, Value::Int))
            .collect();
        return Ok(data);
    }

    if is_float_type(&dtype) {
        let col = column.cast(&DataType::Float64)?;
        let data: Vec<Value> = col
            .f64()?
            .into_iter()
            .map(|v| v.map_or(Value::Null, Value::Float))
            .collect();
        return Ok(data);
    }

    let col = column.cast(&DataType::String)?;
    let data: Vec<Value> = col
        .str()?
        .into_iter()
        .map(|v| match v {
            Some(s) => Value::Text(s.replace("\r\n", " ↵ ").replace('\n', " ↵ ")),
            None => Value::Null,
        })
        .collect();
    Ok(data)
}

fn load_csv(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyCsvReader::new(PlPath::Local(path.into()))
        .with_has_header(true)
        .finish()
}

fn load_parquet(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyFrame::scan_parquet(PlPath::Local(path.into()), ScanArgsParquet::default())
}

fn load_arrow(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyFrame::scan_ipc(
        PlPath::Local(path.into()),
        polars::io::ipc::IpcScanOptions,
        UnifiedScanArgs::default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("tv-{}-{name}", std::process::id()));
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn file_type_from_extension() {
        assert_eq!(detect_file_type(Path::new("a.csv")).ok(), Some(FileType::CSV));
        assert_eq!(detect_file_type(Path::new("a.PQ")).ok(), Some(FileType::PARQUET));
        assert_eq!(
            detect_file_type(Path::new("a.feather")).ok(),
            Some(FileType::ARROW)
        );
        assert!(matches!(
            detect_file_type(Path::new("a.xlsx")),
            Err(TVError::UnknownFileType)
        ));
        assert!(matches!(
            detect_file_type(Path::new("noext")),
            Err(TVError::UnknownFileType)
        ));
    }

    #[test]
    fn missing_file_is_reported() {
        let result = load_data_file(PathBuf::from("/definitely/not/here.csv"));
        assert!(matches!(result, Err(TVError::FileNotFound)));
    }

    #[test]
    fn directory_is_not_a_file() {
        let result = load_data_file(std::env::temp_dir());
        assert!(matches!(result, Err(TVError::LoadingFailed(_, _))));
    }

    #[test]
    fn expand_path_passes_plain_paths() {
        let path = expand_path("data/people.csv").unwrap();
        assert_eq!(path, PathBuf::from("data/people.csv"));
    }

    #[test]
    fn csv_keeps_numeric_columns_numeric() {
        let path = temp_file(
            "people.csv",
            "name,age,score\nJohn Doe,25,1.5\nJane Doe,30,\nBob Smith,22,3.25\n",
        );
        let data = load_data_file(path.clone()).unwrap();
        fs::remove_file(&path).ok();

        let ids: Vec<&str> = data.columns.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["name", "age", "score"]);
        assert_eq!(data.records.len(), 3);
        assert_eq!(data.records[0].get("name"), &Value::from("John Doe"));
        assert_eq!(data.records[0].get("age"), &Value::Int(25));
        assert_eq!(data.records[2].get("score"), &Value::Float(3.25));
        assert!(data.records[1].get("score").is_null());
        assert!(data.name.ends_with("people.csv"));
    }
}
