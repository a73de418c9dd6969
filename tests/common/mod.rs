#![allow(dead_code)]

use http::Method;
use serde_json::{json, Value};
use std::sync::Arc;
use swaggery::api::{ApiDef, Catalog, OperationDef, ParameterMeta, ResourceDef};
use swaggery::dispatcher::{Dispatcher, RawRequest};
use swaggery::flow::Respond;
use swaggery::model::{ModelRef, ModelType, NativeType};
use swaggery::render::Rendered;
use swaggery::server::AppService;

fn int(description: &str) -> ModelRef {
    ModelRef::native(NativeType::Integer, description)
}

fn text(description: &str) -> ModelRef {
    ModelRef::native(NativeType::String, description)
}

/// A small arithmetic API exercising every parameter facet and outcome.
pub fn calc_catalog() -> Catalog {
    let mut catalog = Catalog::new().unwrap();
    catalog
        .register_model(
            ModelType::custom(
                "Quotient",
                "Result of an integer division.",
                json!({
                    "type": "object",
                    "properties": {"quotient": {"type": "integer"}, "remainder": {"type": "integer"}}
                }),
            ),
            None,
        )
        .unwrap();
    catalog
        .register_api(ApiDef::new("Calc", "calc", "1.0").doc("Basic arithmetic."))
        .unwrap();

    catalog
        .register_resource(
            ResourceDef::new("Adder", "Calc")
                .subpath("add/<a>")
                .doc("Addition.")
                .operation(
                    OperationDef::new("add", Method::GET, |call| {
                        let a: i64 = call.param_as("a")?;
                        let b: i64 = call.param_as("b")?;
                        Ok(Respond::json(200, a + b))
                    })
                    .doc("Add two integers.")
                    .param(ParameterMeta::path("a", int("Left operand.")))
                    .param(
                        ParameterMeta::query("b", int("Right operand.").with("defaultValue", 0).unwrap())
                            .optional(),
                    )
                    .response(200, "Ok", Some("integer")),
                ),
        )
        .unwrap();

    catalog
        .register_resource(
            ResourceDef::new("Divider", "Calc")
                .subpath("divide")
                .doc("Integer division.")
                .operation(
                    OperationDef::new("divide", Method::POST, |call| {
                        let n: i64 = call.param_as("n")?;
                        let d: i64 = call.param_as("d")?;
                        if d == 0 {
                            return Ok(Respond::status(400));
                        }
                        Ok(Respond::json(200, json!({"quotient": n / d, "remainder": n % d})))
                    })
                    .doc("Divide n by d.")
                    .param(ParameterMeta::form("n", int("Dividend.")))
                    .param(ParameterMeta::form("d", int("Divisor.")))
                    .response(200, "Ok", Some("Quotient"))
                    .response(400, "Division by zero.", None),
                ),
        )
        .unwrap();

    catalog
        .register_resource(
            ResourceDef::new("Counter", "Calc")
                .subpath("count/<upto>")
                .doc("Integer sequences.")
                .operation(
                    OperationDef::new("count", Method::GET, |call| {
                        let upto: i64 = call.param_as("upto")?;
                        Ok(Respond::stream(200, 1..=upto))
                    })
                    .doc("Stream 1..=upto.")
                    .param(ParameterMeta::path("upto", int("Last value.")))
                    .response(200, "Ok", Some("integer")),
                ),
        )
        .unwrap();

    catalog
        .register_resource(
            ResourceDef::new("Naturals", "Calc")
                .subpath("naturals")
                .doc("The natural numbers, without end.")
                .operation(
                    OperationDef::new("naturals", Method::GET, |_| {
                        Ok(Respond::stream(200, 0_u64..))
                    })
                    .doc("Stream 0, 1, 2, ...")
                    .response(200, "Ok", Some("integer")),
                ),
        )
        .unwrap();

    catalog
        .register_resource(
            ResourceDef::new("Echo", "Calc")
                .subpath("echo")
                .doc("Reflects its inputs.")
                .operation(
                    OperationDef::new("echo", Method::POST, |call| {
                        Ok(Respond::json(
                            200,
                            json!({"token": call.param("X-Token"), "doc": call.param("doc")}),
                        ))
                    })
                    .doc("Echo a header and a JSON body.")
                    .param(ParameterMeta::header("X-Token", text("Caller token.")))
                    .param(ParameterMeta::body("doc", ModelRef::named("Quotient", "Anything.")))
                    .response(200, "Ok", None),
                ),
        )
        .unwrap();

    catalog
        .register_resource(
            ResourceDef::new("Faults", "Calc")
                .subpath("fault/<kind>")
                .doc("Misbehaving handlers.")
                .operation(
                    OperationDef::new("fault", Method::GET, |call| {
                        let kind: String = call.param_as("kind")?;
                        match kind.as_str() {
                            "panic" => panic!("secret panic detail"),
                            "error" => Err(anyhow::anyhow!("secret error detail")),
                            "teapot" => Ok(Respond::status(418)),
                            "missing" => Ok(Respond::status(404)),
                            _ => Ok(Respond::status(204)),
                        }
                    })
                    .doc("Fail in the requested way.")
                    .param(ParameterMeta::path("kind", text("How to fail.")))
                    .response(204, "Nothing to report.", None)
                    .response(404, "No such fault.", None),
                ),
        )
        .unwrap();

    catalog
}

pub fn service(catalog: Catalog) -> AppService {
    AppService::new(Arc::new(Dispatcher::new(Arc::new(catalog)).unwrap()))
}

pub fn calc_service() -> AppService {
    service(calc_catalog())
}

/// Handle `req` in-process and return the status and parsed JSON body
/// (`Value::Null` for an empty body).
pub fn call(svc: &AppService, req: &RawRequest) -> (u16, Value) {
    let rendered = svc.handle(req);
    let status = rendered.status;
    (status, body_json(rendered))
}

pub fn body_json(rendered: Rendered) -> Value {
    let bytes = rendered.into_bytes();
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    }
}

pub mod test_server {
    use std::sync::Once;

    /// Ensures May coroutines are configured only once
    static MAY_INIT: Once = Once::new();

    pub fn setup_may_runtime() {
        MAY_INIT.call_once(|| {
            may::config().set_stack_size(0x8000);
        });
    }
}

pub mod wire {
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpStream};
    use std::time::Duration;

    pub fn send_request(addr: &SocketAddr, req: &str) -> String {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(req.as_bytes()).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_millis(200)))
            .unwrap();
        let mut buf = Vec::new();
        loop {
            let mut tmp = [0u8; 1024];
            match stream.read(&mut tmp) {
                Ok(0) => break,
                Ok(n) => buf.extend_from_slice(&tmp[..n]),
                Err(ref e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    break
                }
                Err(e) => panic!("read error: {:?}", e),
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    /// Split a raw response into status, header block and body.
    pub fn parse_response(resp: &str) -> (u16, String, String) {
        let (head, body) = resp.split_once("\r\n\r\n").unwrap_or((resp, ""));
        let status = head
            .lines()
            .next()
            .and_then(|l| l.split_whitespace().nth(1))
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        (status, head.to_string(), body.to_string())
    }
}
