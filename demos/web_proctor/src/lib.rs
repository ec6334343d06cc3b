// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Browser proctoring demo.
//!
//! Shows the webcam with a face-box overlay, a coloured risk circle, and an
//! event log. Three monitors feed one session: face presence from `MediaPipe`
//! `FaceMesh`, page visibility, and microphone loudness. A stop button ends the
//! session and releases every device.
//!
//! Build with: `wasm-pack build --target web demos/web_proctor`
//! Then serve `demos/web_proctor/` and open `index.html`, which loads the
//! `MediaPipe` scripts before the module.

#![no_std]
#![cfg_attr(
    not(target_arch = "wasm32"),
    allow(dead_code, reason = "this crate only runs in the browser")
)]

extern crate alloc;

use alloc::boxed::Box;
use alloc::format;
use alloc::rc::Rc;
use core::cell::RefCell;

use vigil_backend_web::{
    AnalyserSpectrum, DomRiskDisplay, FaceMeshFrames, FaceMeshTracker, MediaCapture, RafLoop,
    VisibilityListener, open_microphone,
};
use vigil_core::config::ProctorConfig;
use vigil_core::session::Session;
use vigil_core::source::{FaceResults, FrameSource as _};
use vigil_core::timing::AnimationTick;
use vigil_core::trace::MonitorKind;
use wasm_bindgen::JsCast as _;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Event, HtmlButtonElement, HtmlElement, HtmlVideoElement};

struct Ui {
    overlay: HtmlElement,
    status: HtmlElement,
    stop_button: HtmlButtonElement,
}

struct App {
    config: ProctorConfig,
    document: Document,
    session: Session<DomRiskDisplay>,
    ui: Ui,
    camera: Option<MediaCapture>,
    tracker: Option<FaceMeshTracker>,
    frames: Option<FaceMeshFrames>,
    microphone: Option<MediaCapture>,
    spectrum: Option<AnalyserSpectrum>,
    visibility: Option<VisibilityListener>,
    raf: Option<RafLoop>,
}

/// Entry point for the proctoring demo.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() -> Result<(), JsValue> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let body = document
        .body()
        .ok_or_else(|| JsValue::from_str("no body"))?;
    let config = ProctorConfig::exam();

    let shell = element(&document, "section")?;
    style(
        &shell,
        "width: 720px; margin: 24px auto; padding: 20px 24px; border-radius: 16px; background: #fff; box-shadow: 0 18px 48px rgba(20,30,50,0.18); display: grid; gap: 14px; font: 14px/1.4 system-ui, sans-serif;",
    )?;
    body.append_child(&shell)?;

    let title = element(&document, "h2")?;
    title.set_text_content(Some("Exam monitoring"));
    shell.append_child(&title)?;

    // -- camera view -------------------------------------------------------
    let video_wrap = element(&document, "div")?;
    style(
        &video_wrap,
        &format!(
            "position: relative; width: {}px; height: {}px; border-radius: 12px; overflow: hidden; background: #111;",
            config.capture.width, config.capture.height,
        ),
    )?;
    let video: HtmlVideoElement = document.create_element("video")?.unchecked_into();
    video.set_autoplay(true);
    video.set_muted(true);
    video.set_attribute("playsinline", "")?;
    video.set_width(config.capture.width);
    video.set_height(config.capture.height);
    style(&video, "width: 100%; height: 100%; object-fit: cover;")?;
    video_wrap.append_child(&video)?;

    let overlay = element(&document, "div")?;
    style(&overlay, "position: absolute; inset: 0; pointer-events: none;")?;
    video_wrap.append_child(&overlay)?;
    shell.append_child(&video_wrap)?;

    // -- risk readout ------------------------------------------------------
    let row = element(&document, "div")?;
    style(&row, "display: flex; gap: 16px; align-items: center;")?;
    let circle = element(&document, "div")?;
    circle.set_id("riskCircle");
    style(
        &circle,
        "width: 72px; height: 72px; border-radius: 50%; display: grid; place-items: center; color: #fff; font: 700 24px/1 system-ui, sans-serif;",
    )?;
    row.append_child(&circle)?;

    let stop_button: HtmlButtonElement = document.create_element("button")?.unchecked_into();
    stop_button.set_text_content(Some("Stop monitoring"));
    row.append_child(&stop_button)?;

    let status = element(&document, "span")?;
    style(&status, "color: #556;")?;
    status.set_text_content(Some("Starting camera and microphone…"));
    row.append_child(&status)?;
    shell.append_child(&row)?;

    let log = element(&document, "ul")?;
    log.set_id("eventLog");
    style(
        &log,
        "max-height: 220px; overflow-y: auto; margin: 0; padding-left: 20px; font: 12px/1.5 ui-monospace, monospace;",
    )?;
    shell.append_child(&log)?;

    // -- session -----------------------------------------------------------
    let display = DomRiskDisplay::new(document.clone(), circle, log.into());
    let session = Session::new(config, vigil_backend_web::timebase(), display);

    let app = Rc::new(RefCell::new(App {
        config,
        document: document.clone(),
        session,
        ui: Ui {
            overlay,
            status,
            stop_button,
        },
        camera: None,
        tracker: None,
        frames: None,
        microphone: None,
        spectrum: None,
        visibility: None,
        raf: None,
    }));

    let visibility_app = Rc::clone(&app);
    let listener = VisibilityListener::new(document, move |state| {
        visibility_app
            .borrow_mut()
            .session
            .on_visibility_change(state, vigil_backend_web::now());
    });
    match listener {
        Ok(listener) => app.borrow_mut().visibility = Some(listener),
        Err(err) => {
            web_sys::console::error_2(&"Visibility listener failed".into(), &err);
            app.borrow_mut()
                .session
                .report_failure(MonitorKind::Visibility, vigil_backend_web::now());
        }
    }

    bind_stop(&app)?;

    wasm_bindgen_futures::spawn_local(start_camera(Rc::clone(&app), video));
    wasm_bindgen_futures::spawn_local(start_microphone(Rc::clone(&app)));

    let tick_app = Rc::clone(&app);
    let raf = RafLoop::new(move |tick| on_tick(&tick_app, tick));
    raf.start();
    app.borrow_mut().raf = Some(raf);

    Ok(())
}

async fn start_camera(app: Rc<RefCell<App>>, video: HtmlVideoElement) {
    let config = app.borrow().config;
    let capture = match MediaCapture::camera().await {
        Ok(capture) => capture,
        Err(err) => {
            web_sys::console::error_2(&"Camera access denied".into(), &err);
            camera_failed(&app);
            return;
        }
    };
    capture.attach(&video);

    let started = FaceMeshTracker::start(&video, &config.detector, &config.capture).await;
    let mut app = app.borrow_mut();
    if !app.session.is_running() {
        // Stopped while waiting for permission.
        capture.stop();
        if let Ok((tracker, _)) = started {
            tracker.stop();
        }
        return;
    }
    match started {
        Ok((tracker, frames)) => {
            app.tracker = Some(tracker);
            app.frames = Some(frames);
            app.ui.status.set_text_content(Some("Monitoring"));
        }
        Err(err) => {
            web_sys::console::error_2(&"Face detector failed to start".into(), &err);
            app.session
                .report_failure(MonitorKind::Camera, vigil_backend_web::now());
            app.ui.status.set_text_content(Some("Camera unavailable"));
        }
    }
    app.camera = Some(capture);
}

fn camera_failed(app: &Rc<RefCell<App>>) {
    let mut app = app.borrow_mut();
    app.session
        .report_failure(MonitorKind::Camera, vigil_backend_web::now());
    app.ui.status.set_text_content(Some("Camera unavailable"));
}

async fn start_microphone(app: Rc<RefCell<App>>) {
    let config = app.borrow().config;
    let opened = open_microphone(&config.audio).await;
    let mut app = app.borrow_mut();
    match opened {
        Some((capture, spectrum)) if app.session.is_running() => {
            app.microphone = Some(capture);
            app.spectrum = Some(spectrum);
        }
        Some((capture, spectrum)) => {
            spectrum.close();
            capture.stop();
        }
        None => {
            app.session
                .report_failure(MonitorKind::Audio, vigil_backend_web::now());
        }
    }
}

fn bind_stop(app: &Rc<RefCell<App>>) -> Result<(), JsValue> {
    let stop_app = Rc::clone(app);
    let stop_cb = Closure::wrap(Box::new(move |_event: Event| {
        stop(&mut stop_app.borrow_mut());
    }) as Box<dyn FnMut(_)>);
    app.borrow()
        .ui
        .stop_button
        .add_event_listener_with_callback("click", stop_cb.as_ref().unchecked_ref())?;
    stop_cb.forget();
    Ok(())
}

fn stop(app: &mut App) {
    if !app.session.stop(vigil_backend_web::now()) {
        return;
    }
    if let Some(raf) = app.raf.as_ref() {
        raf.stop();
    }
    if let Some(tracker) = app.tracker.take() {
        tracker.stop();
    }
    if let Some(camera) = app.camera.take() {
        camera.stop();
    }
    if let Some(spectrum) = app.spectrum.take() {
        spectrum.close();
    }
    if let Some(microphone) = app.microphone.take() {
        microphone.stop();
    }
    app.frames = None;
    app.visibility = None;
    app.ui.overlay.set_inner_html("");
    app.ui.stop_button.set_disabled(true);
    app.ui.status.set_text_content(Some(&format!(
        "Stopped. Final score {} ({}).",
        app.session.score(),
        app.session.band().as_str(),
    )));
}

fn on_tick(app: &Rc<RefCell<App>>, tick: AnimationTick) {
    let mut app = app.borrow_mut();
    let App {
        document,
        session,
        ui,
        frames,
        spectrum,
        ..
    } = &mut *app;

    if let Some(frames) = frames.as_mut() {
        let mut latest = None;
        while let Some(frame) = frames.next_frame() {
            session.on_face_results(&frame.results, frame.at);
            latest = Some(frame.results);
        }
        if let Some(results) = latest
            && let Err(err) = draw_faces(document, &ui.overlay, &results)
        {
            web_sys::console::error_2(&"overlay update failed".into(), &err);
        }
    }

    if let Some(spectrum) = spectrum.as_mut() {
        session.sample_audio(spectrum, tick.now);
    }
}

fn draw_faces(doc: &Document, overlay: &HtmlElement, results: &FaceResults) -> Result<(), JsValue> {
    overlay.set_inner_html("");
    let colour = if results.face_count() > 1 { "#ff5a4f" } else { "#5ce08a" };
    for bounds in results.faces().filter_map(|face| face.bounds()) {
        let bx = element(doc, "div")?;
        style(
            &bx,
            &format!(
                "position: absolute; left: {:.2}%; top: {:.2}%; width: {:.2}%; height: {:.2}%; border: 2px solid {colour}; border-radius: 6px;",
                bounds.x0 * 100.0,
                bounds.y0 * 100.0,
                bounds.width() * 100.0,
                bounds.height() * 100.0,
            ),
        )?;
        overlay.append_child(&bx)?;
    }
    Ok(())
}

fn element(doc: &Document, tag: &str) -> Result<HtmlElement, JsValue> {
    Ok(doc.create_element(tag)?.unchecked_into())
}

fn style(el: &web_sys::Element, css: &str) -> Result<(), JsValue> {
    el.set_attribute("style", css)
}
