//! 读回 DXF 组码对并汇总结构，用于导出报告与测试。

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::IoError;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DxfSummary {
    pub version: Option<String>,
    pub project_name: Option<String>,
    pub handle_seed: Option<String>,
    pub layers: Vec<String>,
    pub blocks: Vec<String>,
    /// 实体类型 → 数量。
    pub entities: BTreeMap<String, usize>,
    /// 实体类型 → 出现过的子类标记（组码 100）。
    pub subclass_markers: BTreeMap<String, BTreeSet<String>>,
    /// 实体段中缺少句柄（组码 5）的实体数。
    pub entities_without_handle: usize,
    /// 全文件的句柄，按出现顺序。
    pub handles: Vec<String>,
    /// 每个 INSERT 引用的块名。
    pub inserts: Vec<String>,
    pub hatch_patterns: Vec<String>,
    pub texts: Vec<String>,
}

impl DxfSummary {
    pub fn entity_count(&self, kind: &str) -> usize {
        self.entities.get(kind).copied().unwrap_or(0)
    }

    pub fn has_marker(&self, kind: &str, marker: &str) -> bool {
        self.subclass_markers
            .get(kind)
            .is_some_and(|markers| markers.contains(marker))
    }

    /// 句柄互不重复，且都小于 `$HANDSEED`。
    pub fn handles_are_consistent(&self) -> bool {
        let Some(seed) = self.handle_seed.as_deref().and_then(parse_handle) else {
            return false;
        };
        let mut seen = BTreeSet::new();
        self.handles.iter().all(|handle| {
            parse_handle(handle).is_some_and(|value| value < seed) && seen.insert(handle.as_str())
        })
    }
}

fn parse_handle(handle: &str) -> Option<u64> {
    u64::from_str_radix(handle, 16).ok()
}

/// 实体段中正在读取的实体。
struct OpenEntity {
    kind: String,
    has_handle: bool,
    markers: BTreeSet<String>,
}

impl OpenEntity {
    fn close(self, summary: &mut DxfSummary) {
        if !self.has_handle {
            summary.entities_without_handle += 1;
        }
        summary
            .subclass_markers
            .entry(self.kind)
            .or_default()
            .extend(self.markers);
    }
}

struct DxfReader<'a> {
    lines: std::str::Lines<'a>,
    line_number: usize,
}

impl<'a> DxfReader<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            lines: source.lines(),
            line_number: 0,
        }
    }

    fn next_pair(&mut self) -> Result<Option<(i32, &'a str)>, IoError> {
        let Some(code_line) = self.lines.next() else {
            return Ok(None);
        };
        self.line_number += 1;
        let Some(value_line) = self.lines.next() else {
            return Err(IoError::InvalidDocument(format!(
                "文件在第 {} 行结束，缺少与组码对应的值行",
                self.line_number
            )));
        };
        self.line_number += 1;
        let code = code_line.trim().parse::<i32>().map_err(|_| {
            IoError::InvalidDocument(format!(
                "第 {} 行的组码 \"{}\" 无法解析为整数",
                self.line_number - 1,
                code_line.trim()
            ))
        })?;
        Ok(Some((code, value_line.trim_end_matches('\r'))))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Nothing,
    SectionName,
    LayerName,
    BlockName,
    HatchPattern,
    InsertBlock,
    TextValue,
}

pub fn summarize(bytes: &[u8]) -> Result<DxfSummary, IoError> {
    let source = std::str::from_utf8(bytes)
        .map_err(|err| IoError::InvalidDocument(format!("DXF 不是有效的 UTF-8：{err}")))?;
    let mut reader = DxfReader::new(source);
    let mut summary = DxfSummary::default();
    let mut section = String::new();
    let mut pending = Pending::Nothing;
    let mut variable: Option<&str> = None;
    let mut open: Option<OpenEntity> = None;

    while let Some((code, value)) = reader.next_pair()? {
        match code {
            0 => {
                if let Some(entity) = open.take() {
                    entity.close(&mut summary);
                }
                pending = match (section.as_str(), value) {
                    (_, "SECTION") => Pending::SectionName,
                    (_, "ENDSEC") => {
                        section.clear();
                        Pending::Nothing
                    }
                    ("TABLES", "LAYER") => Pending::LayerName,
                    ("BLOCKS", "BLOCK") => Pending::BlockName,
                    ("ENTITIES", kind) => {
                        *summary.entities.entry(kind.to_string()).or_insert(0) += 1;
                        open = Some(OpenEntity {
                            kind: kind.to_string(),
                            has_handle: false,
                            markers: BTreeSet::new(),
                        });
                        match kind {
                            "HATCH" => Pending::HatchPattern,
                            "INSERT" => Pending::InsertBlock,
                            "TEXT" => Pending::TextValue,
                            _ => Pending::Nothing,
                        }
                    }
                    _ => Pending::Nothing,
                };
            }
            2 => match pending {
                Pending::SectionName => {
                    section = value.to_string();
                    pending = Pending::Nothing;
                }
                Pending::LayerName => {
                    summary.layers.push(value.to_string());
                    pending = Pending::Nothing;
                }
                Pending::BlockName => {
                    summary.blocks.push(value.to_string());
                    pending = Pending::Nothing;
                }
                Pending::HatchPattern => {
                    summary.hatch_patterns.push(value.to_string());
                    pending = Pending::Nothing;
                }
                Pending::InsertBlock => {
                    summary.inserts.push(value.to_string());
                    pending = Pending::Nothing;
                }
                _ => {}
            },
            1 if pending == Pending::TextValue => {
                summary.texts.push(value.to_string());
                pending = Pending::Nothing;
            }
            1 if variable == Some("$ACADVER") => summary.version = Some(value.to_string()),
            1 if variable == Some("$PROJECTNAME") => summary.project_name = Some(value.to_string()),
            5 if variable == Some("$HANDSEED") => summary.handle_seed = Some(value.to_string()),
            5 => {
                summary.handles.push(value.to_string());
                if let Some(entity) = open.as_mut() {
                    entity.has_handle = true;
                }
            }
            100 => {
                if let Some(entity) = open.as_mut() {
                    entity.markers.insert(value.to_string());
                }
            }
            _ => {}
        }
        variable = (code == 9).then_some(value);
    }

    if section.is_empty() {
        Ok(summary)
    } else {
        Err(IoError::InvalidDocument(format!("段 {section} 缺少 ENDSEC")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_entities_and_tables() {
        let source = "0\nSECTION\n2\nHEADER\n9\n$ACADVER\n1\nAC1015\n0\nENDSEC\n\
                      0\nSECTION\n2\nTABLES\n0\nTABLE\n2\nLAYER\n0\nLAYER\n2\nA-WALL\n0\nENDTAB\n0\nENDSEC\n\
                      0\nSECTION\n2\nENTITIES\n0\nLINE\n8\nA-WALL\n0\nTEXT\n8\nA-ANNO\n1\nHej\n0\nLINE\n8\nA-WALL\n0\nENDSEC\n\
                      0\nEOF\n";
        let summary = summarize(source.as_bytes()).unwrap();
        assert_eq!(summary.version.as_deref(), Some("AC1015"));
        assert_eq!(summary.layers, ["A-WALL"]);
        assert_eq!(summary.entity_count("LINE"), 2);
        assert_eq!(summary.texts, ["Hej"]);
        // 没有句柄与子类标记的实体照样计数
        assert_eq!(summary.entities_without_handle, 3);
        assert!(!summary.handles_are_consistent());
    }

    #[test]
    fn reads_handles_and_subclass_markers() {
        let source = "0\nSECTION\n2\nHEADER\n9\n$HANDSEED\n5\n3\n9\n$PROJECTNAME\n1\nHus ^JA\n0\nENDSEC\n\
                      0\nSECTION\n2\nENTITIES\n\
                      0\nINSERT\n5\n1\n330\n0\n100\nAcDbEntity\n8\nA-DOOR\n100\nAcDbBlockReference\n2\nDOOR\n\
                      0\nLINE\n5\n2\n100\nAcDbEntity\n8\nA-WALL\n100\nAcDbLine\n\
                      0\nENDSEC\n0\nEOF\n";
        let summary = summarize(source.as_bytes()).unwrap();
        assert_eq!(summary.project_name.as_deref(), Some("Hus ^JA"));
        assert_eq!(summary.handle_seed.as_deref(), Some("3"));
        assert_eq!(summary.handles, ["1", "2"]);
        assert_eq!(summary.inserts, ["DOOR"]);
        assert_eq!(summary.entities_without_handle, 0);
        assert!(summary.has_marker("INSERT", "AcDbBlockReference"));
        assert!(summary.has_marker("LINE", "AcDbEntity"));
        assert!(!summary.has_marker("LINE", "AcDbBlockReference"));
        assert!(summary.handles_are_consistent());
    }

    #[test]
    fn rejects_truncated_input() {
        assert!(matches!(
            summarize(b"0\nSECTION\n2"),
            Err(IoError::InvalidDocument(_))
        ));
        assert!(matches!(
            summarize(b"x\nSECTION\n"),
            Err(IoError::InvalidDocument(_))
        ));
        assert!(matches!(
            summarize(b"0\nSECTION\n2\nENTITIES\n"),
            Err(IoError::InvalidDocument(_))
        ));
    }
}
