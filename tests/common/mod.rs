#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::io::Cursor;

use hullprint::{ImageError, ImageSource};

/// serves registered URLs, answers 404 for everything else
#[derive(Default)]
pub struct Memory {
    images: HashMap<String, Vec<u8>>,
}

impl Memory {
    pub fn with(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.images.insert(url.to_string(), bytes);
        self
    }
}

impl ImageSource for Memory {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, ImageError>> + Send {
        let result = self
            .images
            .get(url)
            .cloned()
            .ok_or_else(|| ImageError::fetch(url, "proxy answered 404 Not Found"));
        async move { result }
    }
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 7 % 256) as u8, (y * 5 % 256) as u8, 160])
    });
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    buf.into_inner()
}

pub fn photo_url(i: usize) -> String {
    format!("https://cdn.example/boats/{}.png", i)
}
