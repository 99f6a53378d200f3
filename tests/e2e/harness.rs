use std::io::Read;
use std::net::TcpListener;
use std::process::{Command, Output};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use chrono::NaiveDate;
use serde_json::{Value, json};
use tiny_http::{Header, Request, Response, Server};

pub const USERNAME: &str = "admin";
pub const PASSWORD: &str = "admin123";
const TOKEN: &str = "e2e-token";

pub struct TestContext {
    pub bin_path: &'static str,
}

pub struct CommandOutput {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl TestContext {
    pub fn new() -> Result<Self, String> {
        Ok(Self {
            bin_path: env!("CARGO_BIN_EXE_procurement-conformance"),
        })
    }

    pub fn run_conformance(&self, args: &[&str]) -> Result<CommandOutput, String> {
        if std::env::var("CONFORMANCE_E2E_LOG").is_ok() {
            eprintln!("command: {} {:?}", self.bin_path, args);
        }
        let output = Command::new(self.bin_path)
            .args(args)
            .env_remove("RUST_LOG")
            .output()
            .map_err(|e| format!("Failed to run command: {}", e))?;
        Ok(CommandOutput::from_output(output))
    }
}

impl CommandOutput {
    pub fn from_output(output: Output) -> Self {
        let status = output.status.code().unwrap_or(-1);
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        Self {
            status,
            stdout,
            stderr,
        }
    }

    pub fn assert_success(&self) -> Result<(), String> {
        if self.status == 0 {
            Ok(())
        } else {
            Err(format!(
                "Expected success, got exit {}.\nstdout: {}\nstderr: {}",
                self.status, self.stdout, self.stderr
            ))
        }
    }

    pub fn assert_exit(&self, code: i32) -> Result<(), String> {
        if self.status == code {
            Ok(())
        } else {
            Err(format!(
                "Expected exit {}, got {}.\nstdout: {}\nstderr: {}",
                code, self.status, self.stdout, self.stderr
            ))
        }
    }

    pub fn assert_stdout_contains(&self, needle: &str) -> Result<(), String> {
        if self.stdout.contains(needle) {
            Ok(())
        } else {
            Err(format!(
                "Expected stdout to contain '{}'.\nstdout: {}",
                needle, self.stdout
            ))
        }
    }

    pub fn assert_stdout_not_contains(&self, needle: &str) -> Result<(), String> {
        if !self.stdout.contains(needle) {
            Ok(())
        } else {
            Err(format!(
                "Expected stdout to not contain '{}'.\nstdout: {}",
                needle, self.stdout
            ))
        }
    }

    pub fn assert_stderr_contains(&self, needle: &str) -> Result<(), String> {
        if self.stderr.contains(needle) {
            Ok(())
        } else {
            Err(format!(
                "Expected stderr to contain '{}'.\nstderr: {}",
                needle, self.stderr
            ))
        }
    }
}

pub fn parse_json(output: &str) -> Result<Value, String> {
    serde_json::from_str(output).map_err(|e| format!("Invalid JSON output: {}", e))
}

/// A base URL nothing is listening on
pub fn unused_base_url() -> Result<String, String> {
    let listener = TcpListener::bind("127.0.0.1:0").map_err(|e| e.to_string())?;
    let addr = listener.local_addr().map_err(|e| e.to_string())?;
    drop(listener);
    Ok(format!("http://{}", addr))
}

/// Ways the fake service can deviate from the contract
#[derive(Debug, Clone, Copy, Default)]
pub struct Deviations {
    /// Serve the listing without a credential
    pub skip_auth: bool,
    /// Accept out-of-contract parameters
    pub skip_validation: bool,
    /// Return every record unfiltered in storage order
    pub ignore_filters: bool,
}

/// Fake procurement service with a small fixed data set
pub struct FakeService {
    server: Arc<Server>,
    worker: Option<JoinHandle<()>>,
}

impl FakeService {
    pub fn start(deviations: Deviations) -> Result<Self, String> {
        let server = Arc::new(
            Server::http("127.0.0.1:0").map_err(|e| format!("Failed to bind fake service: {}", e))?,
        );

        let worker = {
            let server = Arc::clone(&server);
            thread::spawn(move || {
                for request in server.incoming_requests() {
                    handle(request, deviations);
                }
            })
        };

        Ok(Self {
            server,
            worker: Some(worker),
        })
    }

    pub fn base_url(&self) -> String {
        match self.server.server_addr().to_ip() {
            Some(addr) => format!("http://{}", addr),
            None => String::new(),
        }
    }
}

impl Drop for FakeService {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn handle(mut request: Request, deviations: Deviations) {
    let url = request.url().to_string();
    let (path, query) = url.split_once('?').unwrap_or((url.as_str(), ""));
    let params: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect();

    let (status, body) = match path {
        "/api/auth/login" => {
            let mut body = String::new();
            let _ = request.as_reader().read_to_string(&mut body);
            login(&body)
        }
        "/api/procurement/delivery-requests" => {
            let authorized = request
                .headers()
                .iter()
                .find(|h| h.field.equiv("Authorization"))
                .is_some_and(|h| h.value.as_str() == format!("Bearer {}", TOKEN));
            if !authorized && !deviations.skip_auth {
                failure(401, "인증 토큰이 필요합니다.")
            } else {
                listing(&params, deviations)
            }
        }
        _ => failure(404, "not found"),
    };

    let content_type = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
        .expect("static header is valid");
    let response = Response::from_string(body.to_string())
        .with_status_code(status)
        .with_header(content_type);
    let _ = request.respond(response);
}

fn failure(status: u16, message: &str) -> (u16, Value) {
    (status, json!({"success": false, "message": message}))
}

fn login(body: &str) -> (u16, Value) {
    let Ok(credentials) = serde_json::from_str::<Value>(body) else {
        return failure(400, "invalid JSON");
    };
    if credentials["username"] == USERNAME && credentials["password"] == PASSWORD {
        (200, json!({"success": true, "data": {"token": TOKEN}}))
    } else {
        (200, json!({"success": false, "message": "아이디 또는 비밀번호가 올바르지 않습니다."}))
    }
}

fn records() -> Vec<Value> {
    vec![
        record("R1", "조달", "2024-03-15", "경기도 수원시", "영상감시장치", 1_200_000),
        record("R2", "마스", "2023-11-02", "서울특별시", "책상", 350_000),
        record("R3", "조달", "2024-07-01", "경기도교육청", "감시카메라", 980_000),
        record("R4", "마스", "2024-01-20", "부산광역시", "의자", 120_000),
        record("R5", "조달", "2022-05-09", "경기도 성남시", "복사기", 450_000),
        record("R6", "마스", "2024-10-05", "경기도 용인시", "감시용 드론", 2_100_000),
    ]
}

fn record(no: &str, category: &str, date: &str, institution: &str, product: &str, amount: u64) -> Value {
    json!({
        "dlvrReqNo": no,
        "exclcProdctYn": category,
        "dlvrReqRcptDate": date,
        "dminsttNm": institution,
        "prdctClsfcNoNm": product,
        "incdecAmt": amount
    })
}

fn listing(params: &[(String, String)], deviations: Deviations) -> (u16, Value) {
    let param = |key: &str| {
        params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    };

    let page = param("page").and_then(|p| p.parse::<i64>().ok()).unwrap_or(1);
    let page_size = param("pageSize")
        .and_then(|p| p.parse::<i64>().ok())
        .unwrap_or(10);
    let start = param("startDate").map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d"));
    let end = param("endDate").map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d"));

    if !deviations.skip_validation {
        if page < 1 {
            return failure(400, "page는 1 이상이어야 합니다.");
        }
        if !(1..=100).contains(&page_size) {
            return failure(400, "pageSize는 1에서 100 사이여야 합니다.");
        }
        if matches!(start, Some(Err(_))) || matches!(end, Some(Err(_))) {
            return failure(400, "날짜 형식이 올바르지 않습니다. (YYYY-MM-DD)");
        }
    }
    let page = page.max(1) as usize;
    let page_size = page_size.clamp(1, 100) as usize;

    let mut items = records();
    if !deviations.ignore_filters {
        let date_of = |item: &Value| {
            item["dlvrReqRcptDate"]
                .as_str()
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        };
        if let Some(Ok(start)) = start {
            items.retain(|i| date_of(i).is_some_and(|d| d >= start));
        }
        if let Some(Ok(end)) = end {
            items.retain(|i| date_of(i).is_some_and(|d| d <= end));
        }
        if let Some(category) = param("exclcProdctYn") {
            items.retain(|i| i["exclcProdctYn"] == category);
        }
        if let Some(term) = param("prdctClsfcNoNmSearch") {
            items.retain(|i| i["prdctClsfcNoNm"].as_str().is_some_and(|v| v.contains(term)));
        }
        if let Some(term) = param("dminsttNm") {
            items.retain(|i| i["dminsttNm"].as_str().is_some_and(|v| v.contains(term)));
        }

        let sort_by = param("sortBy").unwrap_or("dlvrReqRcptDate").to_string();
        let ascending = param("sortOrder").is_some_and(|o| o.eq_ignore_ascii_case("asc"));
        items.sort_by(|a, b| {
            let ordering = a[&sort_by].to_string().cmp(&b[&sort_by].to_string());
            if ascending { ordering } else { ordering.reverse() }
        });
    }

    let amount_where = |pred: &dyn Fn(&Value) -> bool| -> u64 {
        items
            .iter()
            .filter(|i| pred(*i))
            .filter_map(|i| i["incdecAmt"].as_u64())
            .sum()
    };
    let total_amount = amount_where(&|_| true);
    let jodal_amount = amount_where(&|i| i["exclcProdctYn"] == "조달");
    let mas_amount = amount_where(&|i| i["exclcProdctYn"] == "마스");

    let total = items.len();
    let page_items: Vec<Value> = items
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .collect();

    (
        200,
        json!({
            "success": true,
            "message": "납품 요구 목록 조회 성공",
            "data": {
                "page": page,
                "pageSize": page_size,
                "total": total,
                "totalAmount": total_amount,
                "jodalTotalAmount": jodal_amount,
                "masTotalAmount": mas_amount,
                "items": page_items
            }
        }),
    )
}
