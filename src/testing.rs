//! Loopback DNS responders for tests.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use hickory_proto::op::{Message, MessageType, ResponseCode};
use hickory_proto::rr::rdata::A;
use hickory_proto::rr::{RData, Record};
use hickory_proto::ProtoError;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, UdpSocket};

/// A running responder and the number of queries it has received.
pub struct Responder {
	pub addr: SocketAddr,
	pub hits: Arc<AtomicUsize>,
}

impl Responder {
	pub fn hits(&self) -> usize {
		self.hits.load(Ordering::SeqCst)
	}
}

/// Build a response echoing the query, with the given rcode and A answers.
pub fn answer(query_bytes: &[u8], rcode: ResponseCode, answers: &[[u8; 4]]) -> Result<Message, ProtoError> {
	let request = Message::from_vec(query_bytes)?;
	let mut response = Message::new();
	response.set_id(request.id());
	response.set_message_type(MessageType::Response);
	response.set_recursion_desired(request.recursion_desired());
	response.set_recursion_available(true);
	response.set_response_code(rcode);
	for query in request.queries() {
		response.add_query(query.clone());
	}
	if let Some(query) = request.queries().first() {
		for ip in answers {
			let addr = Ipv4Addr::new(ip[0], ip[1], ip[2], ip[3]);
			response.add_answer(Record::from_rdata(query.name().clone(), 300, RData::A(A(addr))));
		}
	}
	Ok(response)
}

async fn spawn_udp(rcode: ResponseCode, answers: Vec<[u8; 4]>, noise: bool) -> Responder {
	let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
	let addr = socket.local_addr().unwrap();
	let hits = Arc::new(AtomicUsize::new(0));
	let counter = Arc::clone(&hits);

	tokio::spawn(async move {
		let mut buf = vec![0u8; 4096];
		loop {
			let Ok((len, src)) = socket.recv_from(&mut buf).await else {
				return;
			};
			counter.fetch_add(1, Ordering::SeqCst);
			let Ok(mut response) = answer(&buf[..len], rcode, &answers) else {
				continue;
			};
			if noise {
				// A stray response for some other transaction goes out first
				let real_id = response.id();
				response.set_id(real_id.wrapping_add(1));
				let _ = socket.send_to(&response.to_vec().unwrap(), src).await;
				response.set_id(real_id);
			}
			let _ = socket.send_to(&response.to_vec().unwrap(), src).await;
		}
	});

	Responder { addr, hits }
}

/// Answer every UDP query with `rcode` and the given A records.
pub async fn spawn_udp_responder(rcode: ResponseCode, answers: Vec<[u8; 4]>) -> Responder {
	spawn_udp(rcode, answers, false).await
}

/// Like `spawn_udp_responder`, but precede each answer with one carrying the wrong txid.
pub async fn spawn_udp_responder_with_noise(rcode: ResponseCode, answers: Vec<[u8; 4]>) -> Responder {
	spawn_udp(rcode, answers, true).await
}

/// Answer every TCP query with `rcode` and the given A records.
pub async fn spawn_tcp_responder(rcode: ResponseCode, answers: Vec<[u8; 4]>) -> Responder {
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	let hits = Arc::new(AtomicUsize::new(0));
	let counter = Arc::clone(&hits);

	tokio::spawn(async move {
		loop {
			let Ok((mut stream, _)) = listener.accept().await else {
				return;
			};
			counter.fetch_add(1, Ordering::SeqCst);
			let answers = answers.clone();
			tokio::spawn(async move {
				let mut len_buf = [0u8; 2];
				if stream.read_exact(&mut len_buf).await.is_err() {
					return;
				}
				let mut buf = vec![0u8; u16::from_be_bytes(len_buf) as usize];
				if stream.read_exact(&mut buf).await.is_err() {
					return;
				}
				let Ok(response) = answer(&buf, rcode, &answers) else {
					return;
				};
				let bytes = response.to_vec().unwrap();
				let mut framed = (bytes.len() as u16).to_be_bytes().to_vec();
				framed.extend_from_slice(&bytes);
				let _ = stream.write_all(&framed).await;
			});
		}
	});

	Responder { addr, hits }
}
