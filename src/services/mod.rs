pub mod video_service;
