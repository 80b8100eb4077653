use crate::domain::operation::Operation;
use crate::error::{PoolError, Result};
use std::io::{BufRead, BufReader, Read};

/// Reads the host operation stream: one JSON-encoded operation per line.
/// Blank lines are skipped; a malformed line surfaces as an error without
/// stopping the stream.
pub struct OperationReader<R: Read> {
    reader: BufReader<R>,
}

impl<R: Read> OperationReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            reader: BufReader::new(source),
        }
    }

    pub fn operations(self) -> impl Iterator<Item = Result<Operation>> {
        self.reader
            .lines()
            .filter(|line| match line {
                Ok(line) => !line.trim().is_empty(),
                Err(_) => true,
            })
            .map(|line| {
                let line = line?;
                serde_json::from_str(&line).map_err(PoolError::from)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pool::{AccountId, PoolId};

    #[test]
    fn test_reader_valid_stream() {
        let data = concat!(
            r#"{"op":"credit","account":"milo","asset":{"kind":"native"},"amount":300}"#,
            "\n\n",
            r#"{"op":"withdraw","at":500,"pool_id":0,"account":"bob","amount":75}"#,
            "\n",
        );
        let reader = OperationReader::new(data.as_bytes());
        let results: Vec<Result<Operation>> = reader.operations().collect();

        assert_eq!(results.len(), 2); // blank line skipped
        assert!(matches!(
            results[0].as_ref().unwrap(),
            Operation::Credit { account, .. } if *account == AccountId::from("milo")
        ));
        assert!(matches!(
            results[1].as_ref().unwrap(),
            Operation::Withdraw { pool_id, .. } if *pool_id == PoolId(0)
        ));
    }

    #[test]
    fn test_reader_malformed_line_keeps_going() {
        let data = concat!(
            "{\"op\":\"nonsense\"}\n",
            r#"{"op":"credit","account":"milo","asset":{"kind":"native"},"amount":1}"#,
            "\n",
        );
        let reader = OperationReader::new(data.as_bytes());
        let results: Vec<Result<Operation>> = reader.operations().collect();

        assert_eq!(results.len(), 2);
        assert!(results[0].is_err());
        assert!(results[1].is_ok());
    }
}
