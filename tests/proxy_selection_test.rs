//! Proxy resolution selection priority, observed through built contexts.

mod common;

use common::{downgrade, new_factory, runners, with_context, TestProfile};
use profilenet::base::commandline::CommandLine;
use profilenet::base::neterror::NetError;
use profilenet::proxy::{ProxyResolutionKind, ResolvedProxy};
use profilenet::urlrequest::RequestContextParams;
use std::sync::Arc;
use url::Url;

fn proxy_kind_for(args: &[&str]) -> ProxyResolutionKind {
    let runners = runners();
    let dir = tempfile::tempdir().unwrap();
    let profile = Arc::new(TestProfile::default());

    let factory = new_factory(
        RequestContextParams::new(dir.path().to_path_buf()),
        downgrade(&profile),
        CommandLine::from_args(args.iter().copied()),
        &runners,
    );

    with_context(&factory, |context| {
        context.proxy_resolution_service().kind()
    })
}

#[test]
fn test_no_proxy_wins_even_with_proxy_server_set() {
    assert_eq!(
        proxy_kind_for(&["--no-proxy-server", "--proxy-server=proxy:8080"]),
        ProxyResolutionKind::Direct
    );
}

#[test]
fn test_proxy_server_selects_fixed() {
    assert_eq!(
        proxy_kind_for(&["--proxy-server=proxy:8080", "--proxy-bypass-list=.test"]),
        ProxyResolutionKind::Fixed
    );
}

#[test]
fn test_pac_url_selects_fixed_mandatory() {
    let runners = runners();
    let dir = tempfile::tempdir().unwrap();
    let profile = Arc::new(TestProfile::default());

    let factory = new_factory(
        RequestContextParams::new(dir.path().to_path_buf()),
        downgrade(&profile),
        CommandLine::from_args(["--proxy-pac-url=http://pac.test/proxy.pac"]),
        &runners,
    );

    let (kind, mandatory, resolution) = with_context(&factory, |context| {
        let service = context.proxy_resolution_service();
        (
            service.kind(),
            service.config().pac_mandatory(),
            service.resolve_proxy(&Url::parse("http://example.com/").unwrap()),
        )
    });

    assert_eq!(kind, ProxyResolutionKind::Fixed);
    assert!(mandatory);
    // Mandatory PAC never falls back to direct.
    assert_eq!(resolution, Err(NetError::MandatoryProxyConfigurationFailed));
}

#[test]
fn test_system_resolution_by_default() {
    assert_eq!(proxy_kind_for(&[]), ProxyResolutionKind::System);
}

#[test]
fn test_fixed_resolution_applies_bypass_list() {
    let runners = runners();
    let dir = tempfile::tempdir().unwrap();
    let profile = Arc::new(TestProfile::default());

    let factory = new_factory(
        RequestContextParams::new(dir.path().to_path_buf()),
        downgrade(&profile),
        CommandLine::from_args([
            "--proxy-server=proxy.test:3128",
            "--proxy-bypass-list=.internal.test",
        ]),
        &runners,
    );

    let (proxied, bypassed) = with_context(&factory, |context| {
        let service = context.proxy_resolution_service();
        (
            service.resolve_proxy(&Url::parse("http://example.com/").unwrap()),
            service.resolve_proxy(&Url::parse("http://host.internal.test/").unwrap()),
        )
    });

    match proxied.unwrap() {
        ResolvedProxy::Proxy(server) => {
            assert_eq!(server.host, "proxy.test");
            assert_eq!(server.port, 3128);
        }
        other => panic!("expected proxy, got {:?}", other),
    }
    assert_eq!(bypassed.unwrap(), ResolvedProxy::Direct);
}
