//! Host I/O through the runtime: HTTP, files and extern functions

use crate::support::run;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;
use wavelet::vm::VmError;
use wavelet::{compile, Value, Vm};

/// Serve one connection: wait for the request (and `expect` in it), then
/// answer with `response`. Returns the request as received.
fn serve_once(
    expect: &'static str,
    response: &'static str,
) -> (u16, thread::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            let n = stream.read(&mut buf).unwrap();
            request.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&request);
            if n == 0 || (text.contains("\r\n\r\n") && text.contains(expect)) {
                break;
            }
        }
        stream.write_all(response.as_bytes()).unwrap();
        String::from_utf8_lossy(&request).into_owned()
    });
    (port, server)
}

const FETCH: &str = "async fn main() {
        let r = await http_get(\"URL\");
        let text = match r { Ok(body) => \"body: \" + body, Err(e) => \"error: \" + e };
        print(text);
    }";

#[test]
fn test_http_get() {
    let (port, server) = serve_once(
        "GET",
        "HTTP/1.1 200 OK\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello",
    );
    let source = FETCH.replace("URL", &format!("http://127.0.0.1:{}/greeting", port));
    assert_eq!(run(&source).output, vec!["body: hello".to_string()]);
    let request = server.join().unwrap();
    assert!(request.starts_with("GET /greeting HTTP/1.1\r\n"));
}

#[test]
fn test_http_error_status_is_an_err() {
    let (port, server) = serve_once(
        "GET",
        "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
    );
    let source = FETCH.replace("URL", &format!("http://127.0.0.1:{}/missing", port));
    assert_eq!(run(&source).output, vec!["error: HTTP 404".to_string()]);
    server.join().unwrap();
}

#[test]
fn test_http_post_sends_body() {
    let (port, server) = serve_once(
        "ping",
        "HTTP/1.1 201 Created\r\nContent-Length: 4\r\nConnection: close\r\n\r\npong",
    );
    let source = "async fn send(url: string) -> Result<string, string> {
            let reply = await http_post(url, \"ping\")?;
            return Ok(reply + \"!\");
        }
        async fn main() {
            let r = await send(\"URL\");
            print(match r { Ok(s) => s, Err(e) => e });
        }"
    .replace("URL", &format!("http://127.0.0.1:{}/echo", port));
    assert_eq!(run(&source).output, vec!["pong!".to_string()]);
    let request = server.join().unwrap();
    assert!(request.starts_with("POST /echo HTTP/1.1\r\n"));
    assert!(request.to_ascii_lowercase().contains("content-length: 4\r\n"));
    assert!(request.ends_with("ping"));
}

#[test]
fn test_chunked_response_body() {
    let (port, server) = serve_once(
        "GET",
        "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n5\r\nhello\r\n6\r\n world\r\n0\r\n\r\n",
    );
    let source = FETCH.replace("URL", &format!("http://127.0.0.1:{}/stream", port));
    assert_eq!(run(&source).output, vec!["body: hello world".to_string()]);
    server.join().unwrap();
}

#[test]
fn test_keep_alive_response_body() {
    let (port, server) = serve_once(
        "GET",
        "HTTP/1.1 200 OK\r\nContent-Length: 4\r\nConnection: keep-alive\r\n\r\nwave",
    );
    let source = FETCH.replace("URL", &format!("http://127.0.0.1:{}/", port));
    assert_eq!(run(&source).output, vec!["body: wave".to_string()]);
    server.join().unwrap();
}

#[test]
fn test_unsupported_url_scheme() {
    for url in ["ftp://example.com/", "not a url"] {
        let source = FETCH.replace("URL", url);
        let output = run(&source).output;
        assert_eq!(output.len(), 1);
        assert!(output[0].starts_with("error: "), "{:?}", output);
    }
}

#[test]
fn test_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("note.txt");
    let source = "async fn main() {
            let w = await write_file(\"PATH\", \"wave data\");
            let n = match w { Ok(n) => n, Err(e) => -1 };
            let r = await read_file(\"PATH\");
            let text = match r { Ok(s) => s, Err(e) => \"error: \" + e };
            print(\"{n} {text}\");
        }"
    .replace("PATH", &path.display().to_string());
    assert_eq!(run(&source).output, vec!["9 wave data".to_string()]);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "wave data");
}

#[test]
fn test_missing_file_is_an_err() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.txt");
    let source = "async fn main() -> bool {
            let r = await read_file(\"PATH\");
            return match r { Ok(s) => false, Err(e) => e.len() > 0 };
        }"
    .replace("PATH", &path.display().to_string());
    assert_eq!(run(&source).value, Some(Value::I32(1)));
}

#[test]
fn test_run_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("main.wl");
    std::fs::write(&path, "fn main() -> i32 { return 6 * 7; }").unwrap();
    let execution = wavelet::run_file(&path).unwrap();
    assert_eq!(execution.value, Some(Value::I32(42)));
    let err = wavelet::run_file(&dir.path().join("nope.wl")).unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to read file"));
}

#[test]
fn test_build_wat() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("main.wl");
    let output = dir.path().join("main.wat");
    std::fs::write(&input, "fn main() -> i32 { return 1; }").unwrap();
    wavelet::build_wat(&input, &output).unwrap();
    let text = std::fs::read_to_string(&output).unwrap();
    assert!(text.starts_with("(module"));
    assert!(text.contains("(export \"main\")"));
}

#[test]
fn test_extern_host_functions() {
    let module = compile(
        "extern fn scale(x: f64) -> f64;
         extern fn note(code: i32);
         fn main() -> f64 { note(7); return scale(2.5); }",
    )
    .unwrap();

    let mut vm = Vm::new(module.clone()).unwrap();
    assert!(matches!(vm.run(), Err(VmError::Link(_))));

    let noted = std::rc::Rc::new(std::cell::Cell::new(0));
    let seen = noted.clone();
    let mut vm = Vm::new(module).unwrap();
    vm.register("scale", |args| match args {
        [Value::F64(x)] => Ok(Some(Value::F64(x * 4.0))),
        _ => Err("bad arguments".to_string()),
    });
    vm.register("note", move |args| {
        if let [Value::I32(code)] = args {
            seen.set(*code);
        }
        Ok(None)
    });
    assert_eq!(vm.run().unwrap().value, Some(Value::F64(10.0)));
    assert_eq!(noted.get(), 7);
}
