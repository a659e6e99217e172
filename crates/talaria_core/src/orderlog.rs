use std::fs::{File, OpenOptions};
use std::path::Path;

use csv::Writer;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Terminal status of an order, as reported to the caller and recorded in
/// the audit log.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Accepted,
    Rejected,
    Failed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Accepted => "accepted",
            OrderStatus::Rejected => "rejected",
            OrderStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Error)]
pub enum OrderLogError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Clone, Debug)]
pub struct OrderRecord {
    pub order_id: i64,
    pub place: String,
    pub assigned_uav: Option<String>,
    pub eta_minutes: Option<f64>,
    pub status: OrderStatus,
}

/// Append-only CSV audit sink. Every dispatch outcome gets one row,
/// rejections and failures included. Flushed per append; durability beyond
/// the OS buffer is out of scope. There is no read path.
pub struct OrderLog {
    writer: Writer<File>,
}

const HEADER: [&str; 6] = [
    "timestamp",
    "order_id",
    "place",
    "assigned_uav",
    "eta_minutes",
    "status",
];

impl OrderLog {
    /// Open (or create) the log at `path`, writing the header row only when
    /// the file is new.
    pub fn open(path: &Path) -> Result<Self, OrderLogError> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let is_new = file.metadata()?.len() == 0;

        let mut writer = Writer::from_writer(file);
        if is_new {
            writer.write_record(HEADER)?;
            writer.flush()?;
        }

        Ok(OrderLog { writer })
    }

    pub fn append(&mut self, record: &OrderRecord) -> Result<(), OrderLogError> {
        self.writer.write_record(&[
            Timestamp::now().to_string(),
            record.order_id.to_string(),
            record.place.clone(),
            record.assigned_uav.clone().unwrap_or_default(),
            record
                .eta_minutes
                .map(|eta| format!("{eta:.2}"))
                .unwrap_or_default(),
            record.status.as_str().to_string(),
        ])?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(order_id: i64, status: OrderStatus) -> OrderRecord {
        OrderRecord {
            order_id,
            place: String::from("Al-Jamiya Street"),
            assigned_uav: matches!(status, OrderStatus::Accepted).then(|| String::from("UAV_6_7")),
            eta_minutes: matches!(status, OrderStatus::Accepted).then_some(3.25),
            status,
        }
    }

    #[test]
    fn appends_one_row_per_outcome() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("orders.csv");

        let mut log = OrderLog::open(&path).unwrap();
        log.append(&record(1, OrderStatus::Accepted)).unwrap();
        log.append(&record(2, OrderStatus::Rejected)).unwrap();
        log.append(&record(3, OrderStatus::Failed)).unwrap();
        drop(log);

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], HEADER.join(","));
        assert!(lines[1].ends_with("accepted"));
        assert!(lines[2].ends_with("rejected"));
        assert!(lines[3].ends_with("failed"));
    }

    #[test]
    fn reopen_appends_without_a_second_header() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("orders.csv");

        OrderLog::open(&path)
            .unwrap()
            .append(&record(1, OrderStatus::Accepted))
            .unwrap();
        OrderLog::open(&path)
            .unwrap()
            .append(&record(2, OrderStatus::Accepted))
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let headers = contents.lines().filter(|l| l.starts_with("timestamp")).count();
        assert_eq!(headers, 1);
        assert_eq!(contents.lines().count(), 3);
    }

    #[test]
    fn rejected_orders_leave_vehicle_and_eta_blank() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("orders.csv");

        let mut log = OrderLog::open(&path).unwrap();
        log.append(&record(7, OrderStatus::Rejected)).unwrap();
        drop(log);

        let contents = std::fs::read_to_string(&path).unwrap();
        let row = contents.lines().nth(1).unwrap();
        let fields: Vec<&str> = row.split(',').collect();
        assert_eq!(fields[1], "7");
        assert_eq!(fields[3], "");
        assert_eq!(fields[4], "");
    }
}
