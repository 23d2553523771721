use super::{volume_to_gain, AudioEngine, PlaybackError};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use std::io::Cursor;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info};

/// rodio-backed engine. Pulls the whole stream into memory, then decodes from there.
pub struct AudioPlayer {
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
    sink: Option<Sink>,
    http: reqwest::Client,
    stall_timeout: Duration,
    volume: u8,
    fade_in: Duration,
}

impl AudioPlayer {
    /// `stall_timeout` bounds the connect, the response headers and every gap
    /// between body chunks. A slow but steady download is fine.
    pub fn new(
        volume: u8,
        fade_in: Duration,
        stall_timeout: Duration,
    ) -> Result<Self, PlaybackError> {
        let (stream, stream_handle) =
            OutputStream::try_default().map_err(|e| PlaybackError::Output(e.to_string()))?;
        let http = reqwest::Client::builder()
            .connect_timeout(stall_timeout)
            .build()?;

        Ok(Self {
            _stream: stream,
            stream_handle,
            sink: None,
            http,
            stall_timeout,
            volume,
            fade_in,
        })
    }

    /// Ramp from silence up to the target volume so tracks don't start with a pop.
    async fn ramp_up(&self, sink: &Sink) {
        let target = volume_to_gain(self.volume);
        if self.fade_in.is_zero() {
            sink.set_volume(target);
            return;
        }

        let steps = 10u32;
        let step_duration = self.fade_in / steps;
        for step in 1..=steps {
            sink.set_volume(target * step as f32 / steps as f32);
            tokio::time::sleep(step_duration).await;
        }
        sink.set_volume(target);
    }
}

/// Download the whole body, giving up if the server goes quiet for `stall`.
pub(crate) async fn fetch_stream(
    http: &reqwest::Client,
    url: &str,
    stall: Duration,
) -> Result<Vec<u8>, PlaybackError> {
    let started = Instant::now();
    let mut response = timeout(stall, http.get(url).send())
        .await
        .map_err(|_| PlaybackError::Stalled(stall))??
        .error_for_status()?;

    let capacity = response.content_length().unwrap_or(0).min(64 << 20) as usize;
    let mut bytes = Vec::with_capacity(capacity);
    while let Some(chunk) = timeout(stall, response.chunk())
        .await
        .map_err(|_| PlaybackError::Stalled(stall))??
    {
        bytes.extend_from_slice(&chunk);
    }

    debug!("Fetched {} bytes of audio in {:?}", bytes.len(), started.elapsed());
    Ok(bytes)
}

impl AudioEngine for AudioPlayer {
    async fn start(&mut self, url: &str, volume: u8) -> Result<(), PlaybackError> {
        self.stop();
        self.volume = volume;

        let bytes = fetch_stream(&self.http, url, self.stall_timeout).await?;
        let source = Decoder::new(Cursor::new(bytes))?;

        let sink = Sink::try_new(&self.stream_handle)
            .map_err(|e| PlaybackError::Output(e.to_string()))?;
        sink.set_volume(0.0);
        sink.append(source);
        self.ramp_up(&sink).await;

        self.sink = Some(sink);
        info!("Playback started at volume {}", volume);
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(sink) = &self.sink {
            sink.pause();
        }
    }

    fn resume(&mut self) {
        if let Some(sink) = &self.sink {
            sink.play();
        }
    }

    fn set_volume(&mut self, volume: u8) {
        self.volume = volume;
        if let Some(sink) = &self.sink {
            sink.set_volume(volume_to_gain(volume));
        }
    }

    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    fn is_finished(&self) -> bool {
        self.sink.as_ref().map(|sink| sink.empty()).unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves one connection: reads the request, writes `head`, then holds the socket open.
    async fn serve_once(head: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 2048];
            let _ = socket.read(&mut buf).await;
            socket.write_all(head.as_bytes()).await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });
        format!("http://{}/audio.m4a", addr)
    }

    #[tokio::test]
    async fn test_fetch_reads_full_body() {
        let url = serve_once("HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhello").await;
        let bytes = fetch_stream(&reqwest::Client::new(), &url, Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[tokio::test]
    async fn test_fetch_gives_up_when_body_stalls() {
        let url = serve_once("HTTP/1.1 200 OK\r\nContent-Length: 1000000\r\n\r\nID3").await;
        let started = Instant::now();

        let err = fetch_stream(&reqwest::Client::new(), &url, Duration::from_millis(300))
            .await
            .unwrap_err();

        assert!(matches!(err, PlaybackError::Stalled(_)), "got {err:?}");
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_fetch_gives_up_when_headers_never_arrive() {
        let url = serve_once("").await;
        let err = fetch_stream(&reqwest::Client::new(), &url, Duration::from_millis(300))
            .await
            .unwrap_err();
        assert!(matches!(err, PlaybackError::Stalled(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_fetch_rejects_error_status() {
        let url = serve_once("HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n").await;
        let err = fetch_stream(&reqwest::Client::new(), &url, Duration::from_secs(2))
            .await
            .unwrap_err();
        assert!(matches!(err, PlaybackError::Fetch(_)), "got {err:?}");
    }
}
