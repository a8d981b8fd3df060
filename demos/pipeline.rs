use log::debug;
use settle::future::Future;
use settle::schedule;
use settle::settling::Settling;

fn parse_length(body: String) -> Result<Settling<usize, String>, String> {
    if body.is_empty() {
        return Err("empty body".into());
    }

    Ok(Settling::Value(body.len()))
}

fn main() {
    env_logger::init();

    let (response, resolver) = Future::<String, String>::pair();

    response
        .then(parse_length)
        .then(|n| {
            debug!("measured {n} bytes");
            Ok(Settling::Value(format!("{n} bytes")))
        })
        .catch(|err| Ok(Settling::Value(format!("fell back after: {err}"))))
        .done_accept(|line| println!("{line}"));

    debug!("settling response");
    resolver.accept("hello world".into());

    schedule::run();
}
