//! End-to-end pipeline tests against an in-memory portal.

use std::cell::RefCell;
use std::fs;

use orobnat::error::{AppError, Result};
use orobnat::export::{ExportFormat, ReportExporter};
use orobnat::models::{
    CascadeLevel, OptionMap, ParserConfig, ResultPage, SearchTarget, Selection,
};
use orobnat::pipeline::{run_download, run_listing};
use orobnat::services::{BlockReportParser, Portal, ReportPaginator, validate_selection};

/// Portal fake serving a fixed cascade and a fixed list of result pages.
#[derive(Default)]
struct FakePortal {
    pages: Vec<String>,
    calls: RefCell<Vec<String>>,
    fail_at: Option<usize>,
}

fn options(pairs: &[(&str, &str)]) -> OptionMap {
    pairs
        .iter()
        .map(|(id, label)| (id.to_string(), label.to_string()))
        .collect()
}

impl Portal for FakePortal {
    fn list_regions(&self) -> Result<OptionMap> {
        self.calls.borrow_mut().push("regions".into());
        Ok(options(&[("27", "Bourgogne-Franche-Comté"), ("84", "Auvergne-Rhône-Alpes")]))
    }

    fn list_departments(&self, region: &str) -> Result<OptionMap> {
        self.calls.borrow_mut().push(format!("departments:{region}"));
        Ok(match region {
            "27" => options(&[("021", "CÔTE-D'OR"), ("025", "DOUBS")]),
            "84" => options(&[("069", "RHÔNE")]),
            _ => OptionMap::new(),
        })
    }

    fn list_communes(&self, region: &str, department: &str) -> Result<OptionMap> {
        self.calls
            .borrow_mut()
            .push(format!("communes:{region}/{department}"));
        Ok(match department {
            "021" => options(&[("21231", "DIJON")]),
            _ => OptionMap::new(),
        })
    }

    fn list_networks(&self, region: &str, department: &str, commune: &str) -> Result<OptionMap> {
        self.calls
            .borrow_mut()
            .push(format!("networks:{region}/{department}/{commune}"));
        Ok(match commune {
            "21231" => options(&[("021000123", "DIJON VILLE")]),
            _ => OptionMap::new(),
        })
    }

    fn fetch_result_page(&self, _target: &SearchTarget, position: usize) -> Result<ResultPage> {
        self.calls.borrow_mut().push(format!("search:{position}"));
        if self.fail_at == Some(position) {
            return Err(AppError::parse("connection reset"));
        }
        Ok(ResultPage::new(
            self.pages.get(position).cloned().unwrap_or_else(landing_page),
        ))
    }
}

fn landing_page() -> String {
    r#"<html><body><div class="block-content"><h3 class="search">Rechercher</h3>
       <form><select name="reseau"></select></form></div></body></html>"#
        .to_string()
}

fn report_page(date: &str, installation: &str) -> String {
    format!(
        r#"<html><head><meta http-equiv="Content-Type" content="text/html; charset=ISO-8859-1"></head><body>
          <div class="block-content"><h3 class="infos">Informations générales</h3><table>
            <tr><th>Date</th><td>{date}</td></tr>
            <tr><th>Commune</th><td>DIJON</td></tr>
            <tr><th>Installation</th><td>{installation}</td></tr>
            <tr><th>Service</th><td>DIJON VILLE</td></tr>
            <tr><th>Responsable</th><td>SUEZ</td></tr>
            <tr><th>Maître d'ouvrage</th><td>DIJON METROPOLE</td></tr>
          </table></div>
          <div class="block-content"><h3 class="params">Paramètres</h3><table><tr><td>pH</td></tr></table></div>
        </body></html>"#
    )
}

fn target() -> SearchTarget {
    SearchTarget {
        region: "27".into(),
        department: "021".into(),
        commune: "21231".into(),
        network: "021000123".into(),
    }
}

fn parser() -> BlockReportParser {
    BlockReportParser::new(&ParserConfig::default()).unwrap()
}

fn three_reports() -> FakePortal {
    FakePortal {
        pages: vec![
            report_page("01/03/2024 14h30", "RESERVOIR A"),
            report_page("15/02/2024 09:10", "RESERVOIR B"),
            report_page("02/01/2023", "RESERVOIR C"),
        ],
        ..FakePortal::default()
    }
}

#[test]
fn paginator_yields_consecutive_reports_then_stops() {
    let portal = three_reports();
    let parser = parser();
    let mut paginator = ReportPaginator::new(&portal, &parser, target());

    let installations: Vec<String> = paginator
        .by_ref()
        .map(|r| r.unwrap().installation)
        .collect();

    assert_eq!(installations, ["RESERVOIR A", "RESERVOIR B", "RESERVOIR C"]);
    assert_eq!(paginator.position(), 3);
    assert!(paginator.next().is_none());
    assert_eq!(
        *portal.calls.borrow(),
        ["search:0", "search:1", "search:2", "search:3"]
    );
}

#[test]
fn paginator_stops_at_first_gap() {
    let mut portal = three_reports();
    portal.pages[1] = landing_page();
    let parser = parser();

    let count = ReportPaginator::new(&portal, &parser, target()).count();
    assert_eq!(count, 1);
}

#[test]
fn paginator_on_empty_results_yields_nothing() {
    let portal = FakePortal::default();
    let parser = parser();
    assert_eq!(ReportPaginator::new(&portal, &parser, target()).count(), 0);
}

#[test]
fn paginator_surfaces_fatal_errors_once() {
    let mut portal = three_reports();
    portal.pages[1] = report_page("someday", "RESERVOIR B");
    let parser = parser();
    let mut paginator = ReportPaginator::new(&portal, &parser, target());

    assert!(paginator.next().unwrap().is_ok());
    assert!(matches!(paginator.next(), Some(Err(AppError::Timestamp(_)))));
    assert!(paginator.next().is_none());
    assert_eq!(paginator.position(), 1);
}

#[test]
fn paginator_surfaces_fetch_failures() {
    let portal = FakePortal {
        fail_at: Some(2),
        ..three_reports()
    };
    let parser = parser();
    let results: Vec<_> = ReportPaginator::new(&portal, &parser, target()).collect();

    assert_eq!(results.len(), 3);
    assert!(results[..2].iter().all(|r| r.is_ok()));
    assert!(matches!(results[2], Err(AppError::Parse(_))));
}

#[test]
fn validation_accepts_live_options() {
    let portal = FakePortal::default();
    let selection = Selection {
        region: Some("27".into()),
        department: Some("021".into()),
        commune: Some("21231".into()),
        network: Some("021000123".into()),
    };
    validate_selection(&portal, &selection).unwrap();
    assert_eq!(
        *portal.calls.borrow(),
        [
            "regions",
            "departments:27",
            "communes:27/021",
            "networks:27/021/21231"
        ]
    );
}

#[test]
fn validation_rejects_department_of_another_region() {
    let portal = FakePortal::default();
    let selection = Selection {
        region: Some("84".into()),
        department: Some("021".into()),
        commune: Some("21231".into()),
        network: Some("021000123".into()),
    };
    let err = validate_selection(&portal, &selection).unwrap_err();

    assert!(matches!(
        &err,
        AppError::UnknownOption { level: CascadeLevel::Department, id } if id == "021"
    ));
    assert!(err.is_usage());
    assert_eq!(*portal.calls.borrow(), ["regions", "departments:84"]);
}

#[test]
fn validation_requires_parent_levels() {
    let portal = FakePortal::default();
    let selection = Selection {
        region: Some("27".into()),
        commune: Some("21231".into()),
        ..Selection::default()
    };
    let err = validate_selection(&portal, &selection).unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[test]
fn listing_prints_id_and_label() {
    let portal = FakePortal::default();
    let selection = Selection {
        region: Some("27".into()),
        ..Selection::default()
    };
    let mut out = Vec::new();
    run_listing(&portal, CascadeLevel::Department, &selection, &mut out).unwrap();

    let text = String::from_utf8(out).unwrap();
    assert_eq!(
        text,
        "Départements disponibles pour cette région :\n021: CÔTE-D'OR\n025: DOUBS\n"
    );
}

#[test]
fn download_writes_one_file_per_report_and_format() {
    let dir = tempfile::tempdir().unwrap();
    let portal = three_reports();
    let exporter = ReportExporter::new(
        dir.path(),
        &[ExportFormat::Html, ExportFormat::Json],
        "wkhtmltopdf",
    );

    let summary = run_download(&portal, &parser(), &target(), &exporter).unwrap();

    assert_eq!(summary.report_count, 3);
    assert_eq!(summary.files.len(), 6);
    let html = dir.path().join("HTML/2024/2024-03-01_143000.html");
    assert!(html.is_file());
    assert!(fs::read_to_string(html).unwrap().contains("styled-table"));
    assert!(dir.path().join("HTML/2023/2023-01-02_000000.html").is_file());
    assert!(dir.path().join("JSON/2024/2024-02-15_091000.json").is_file());
}

#[test]
fn download_twice_overwrites_same_paths() {
    let dir = tempfile::tempdir().unwrap();
    let portal = three_reports();
    let exporter = ReportExporter::new(dir.path(), &[ExportFormat::Html], "wkhtmltopdf");

    let first = run_download(&portal, &parser(), &target(), &exporter).unwrap();
    let second = run_download(&portal, &parser(), &target(), &exporter).unwrap();

    assert_eq!(first.files, second.files);
    let year_2024: Vec<_> = fs::read_dir(dir.path().join("HTML/2024")).unwrap().collect();
    assert_eq!(year_2024.len(), 2);
}

#[test]
fn dry_run_parses_everything_and_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let portal = three_reports();

    let summary =
        run_download(&portal, &parser(), &target(), &ReportExporter::dry_run()).unwrap();

    assert_eq!(summary.report_count, 3);
    assert!(summary.files.is_empty());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    assert_eq!(portal.calls.borrow().len(), 4);
}

#[test]
fn download_aborts_on_fatal_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut portal = three_reports();
    portal.pages[2] = report_page("n/a", "RESERVOIR C");
    let exporter = ReportExporter::new(dir.path(), &[ExportFormat::Html], "wkhtmltopdf");

    let err = run_download(&portal, &parser(), &target(), &exporter).unwrap_err();
    assert!(matches!(err, AppError::Timestamp(_)));
    assert!(dir.path().join("HTML/2024/2024-03-01_143000.html").is_file());
}
