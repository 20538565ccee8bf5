//! Deadline enforcement and isolation between concurrent requests.

use image::{ImageFormat, Rgba};
use std::time::{Duration, Instant};

mod common;

use common::{client, red_png, solid_image, start_origin, start_proxy, MockResponse};

fn gray_png(value: u8) -> Vec<u8> {
    solid_image(ImageFormat::Png, Rgba([value, value, value, 255]), 4, 4)
}

fn pixel_of(bytes: &[u8]) -> Rgba<u8> {
    *image::load_from_memory(bytes)
        .unwrap()
        .to_rgba8()
        .get_pixel(0, 0)
}

#[tokio::test]
async fn test_slow_origin_times_out() {
    let origin = start_origin(|_| async {
        MockResponse::ok(red_png()).delayed(Duration::from_secs(3))
    })
    .await;
    let proxy = start_proxy(&origin.url(), 300).await;

    let started = Instant::now();
    let res = client().get(proxy.url("/slow.png")).send().await.unwrap();
    let waited = started.elapsed();

    assert_eq!(res.status(), 408);
    assert_eq!(res.headers()["x-proxy-error"], "TIMEOUT");
    assert!(res.text().await.unwrap().contains("deadline"));
    assert!(waited >= Duration::from_millis(300), "answered early: {:?}", waited);
    assert!(waited < Duration::from_secs(2), "answered late: {:?}", waited);

    proxy.wait_idle(Duration::from_secs(2)).await;
}

#[tokio::test]
async fn test_timed_out_result_never_reaches_a_later_request() {
    let origin = start_origin(|target| async move {
        if target.starts_with("/slow") {
            MockResponse::ok(red_png()).delayed(Duration::from_millis(600))
        } else {
            MockResponse::ok(solid_image(ImageFormat::Png, Rgba([0, 0, 255, 255]), 4, 4))
        }
    })
    .await;
    let proxy = start_proxy(&origin.url(), 300).await;
    let client = client();

    let slow = client.get(proxy.url("/slow.png")).send().await.unwrap();
    assert_eq!(slow.status(), 408);

    // Issued while the slow origin is still sleeping.
    let fast = client.get(proxy.url("/fast.png")).send().await.unwrap();
    assert_eq!(fast.status(), 200);
    assert_eq!(pixel_of(&fast.bytes().await.unwrap()), Rgba([29, 29, 29, 255]));

    tokio::time::sleep(Duration::from_millis(500)).await;
    let again = client.get(proxy.url("/fast.png")).send().await.unwrap();
    assert_eq!(pixel_of(&again.bytes().await.unwrap()), Rgba([29, 29, 29, 255]));

    proxy.wait_idle(Duration::from_secs(2)).await;
}

#[tokio::test]
async fn test_concurrent_requests_get_their_own_images() {
    let origin = start_origin(|target| async move {
        let value: u8 = target
            .trim_start_matches("/img-")
            .trim_end_matches(".png")
            .parse()
            .unwrap_or(0);
        MockResponse::ok(gray_png(value)).delayed(Duration::from_millis(fastrand::u64(0..150)))
    })
    .await;
    let proxy = start_proxy(&origin.url(), 3_000).await;
    let client = client();

    let mut handles = Vec::new();
    for i in 0..24u8 {
        let client = client.clone();
        let url = proxy.url(&format!("/img-{}.png", i * 10));
        handles.push(tokio::spawn(async move {
            let res = client.get(url).send().await.unwrap();
            (res.status().as_u16(), res.bytes().await.unwrap())
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        let (status, body) = handle.await.unwrap();
        assert_eq!(status, 200);
        let v = i as u8 * 10;
        assert_eq!(pixel_of(&body), Rgba([v, v, v, 255]));
    }
    assert_eq!(origin.requests(), 24);
    proxy.wait_idle(Duration::from_secs(2)).await;
}

#[tokio::test]
async fn test_mixed_slow_and_fast_requests() {
    let origin = start_origin(|target| async move {
        let delay = if target.starts_with("/slow") {
            Duration::from_secs(2)
        } else {
            Duration::from_millis(20)
        };
        MockResponse::ok(red_png()).delayed(delay)
    })
    .await;
    let proxy = start_proxy(&origin.url(), 400).await;
    let client = client();

    let mut handles = Vec::new();
    for i in 0..16 {
        let client = client.clone();
        let path = if i % 2 == 0 { "/slow.png" } else { "/fast.png" };
        let url = proxy.url(path);
        handles.push(tokio::spawn(async move {
            (i, client.get(url).send().await.unwrap().status().as_u16())
        }));
    }

    for handle in handles {
        let (i, status) = handle.await.unwrap();
        let expected = if i % 2 == 0 { 408 } else { 200 };
        assert_eq!(status, expected, "request {}", i);
    }
    proxy.wait_idle(Duration::from_secs(2)).await;
}
